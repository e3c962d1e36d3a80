// src/fetch/gnews.rs
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::article::{canonical_timestamp, non_empty, Article};
use crate::config::TrackerConfig;
use crate::fetch::normalize_text;
use crate::fetch::types::NewsProvider;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    source: Option<RawSource>,
    image: Option<String>,
    // NewsAPI-style name for the same field; `image` wins when both are sent
    #[serde(rename = "urlToImage")]
    url_to_image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

impl From<RawArticle> for Article {
    fn from(it: RawArticle) -> Self {
        Article {
            title: normalize_text(it.title.as_deref().unwrap_or_default()),
            description: it
                .description
                .as_deref()
                .map(normalize_text)
                .and_then(non_empty),
            url: it.url.unwrap_or_default().trim().to_string(),
            published_at: it
                .published_at
                .as_deref()
                .map(canonical_timestamp)
                .unwrap_or_default(),
            source: it.source.and_then(|s| s.name).unwrap_or_default(),
            image: it
                .image
                .and_then(non_empty)
                .or_else(|| it.url_to_image.and_then(non_empty)),
            extra: Vec::new(),
        }
    }
}

/// Parse a GNews `search` response body into article records.
pub fn parse_gnews_response(body: &str) -> Result<Vec<Article>> {
    let resp: SearchResponse = serde_json::from_str(body).context("parsing gnews response json")?;
    Ok(resp.articles.into_iter().map(Article::from).collect())
}

/// GNews v4 `search` endpoint client.
pub struct GNewsProvider {
    client: Client,
    base_url: String,
    api_key: String,
    lang: String,
    max: u32,
    timeout: Duration,
}

impl GNewsProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: crate::config::DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            lang: "en".to_string(),
            max: 10,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn from_config(cfg: &TrackerConfig) -> Self {
        Self::new(cfg.api_key.clone().unwrap_or_default())
            .with_base_url(&cfg.base_url)
            .with_lang(&cfg.lang)
            .with_max(cfg.max_per_term)
            .with_timeout(cfg.request_timeout_secs)
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_lang(mut self, lang: &str) -> Self {
        self.lang = lang.to_string();
        self
    }

    pub fn with_max(mut self, max: u32) -> Self {
        self.max = max;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

#[async_trait]
impl NewsProvider for GNewsProvider {
    async fn fetch(&self, term: &str) -> Result<Vec<Article>> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow!("GNews API key is not configured"));
        }
        let t0 = std::time::Instant::now();

        let max = self.max.to_string();
        let resp = self
            .client
            .get(self.search_url())
            .timeout(self.timeout)
            .query(&[
                ("q", term),
                ("lang", self.lang.as_str()),
                ("max", max.as_str()),
                ("token", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("gnews http get()")?;

        let status = resp.status();
        let body = resp.text().await.context("gnews http .text()")?;
        if !status.is_success() {
            let preview: String = body.chars().take(200).collect();
            bail!("gnews search failed: {status}, {preview}");
        }

        let out = parse_gnews_response(&body)?;

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("news_fetch_ms").record(ms);
        counter!("news_fetched_total").increment(out.len() as u64);
        tracing::debug!(target: "fetch", term, count = out.len(), ms, "gnews search ok");
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "GNews"
    }
}
