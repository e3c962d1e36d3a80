// src/fetch/types.rs
use anyhow::Result;

use crate::article::Article;

/// A news search backend queried once per search term.
#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch(&self, term: &str) -> Result<Vec<Article>>;
    fn name(&self) -> &'static str;
}
