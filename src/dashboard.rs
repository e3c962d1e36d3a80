// src/dashboard.rs
//! Read-only query service over the stored articles.
//!
//! `GET /articles` applies the same filters the old dashboard offered: an
//! inclusive date range on the UTC publish date, a case-insensitive keyword
//! match on title or description, and an exact (case-insensitive) source
//! match. Rows whose publish time does not parse are left out. Results are
//! newest first.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use metrics::gauge;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::article::Article;
use crate::store::ArticleStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ArticleStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ArticleStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub q: Option<String>,
    pub source: Option<String>,
}

/// An article with its parsed publish time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedArticle {
    pub published: DateTime<Utc>,
    pub article: Article,
}

impl ArticleFilter {
    fn keeps(&self, row: &DatedArticle) -> bool {
        let day = row.published.date_naive();
        if self.from.is_some_and(|f| day < f) || self.to.is_some_and(|t| day > t) {
            return false;
        }
        if let Some(q) = non_blank(self.q.as_deref()) {
            let needle = q.to_lowercase();
            let in_title = row.article.title.to_lowercase().contains(&needle);
            let in_desc = row
                .article
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !(in_title || in_desc) {
                return false;
            }
        }
        if let Some(src) = non_blank(self.source.as_deref()) {
            if row.article.source.trim().to_lowercase() != src.to_lowercase() {
                return false;
            }
        }
        true
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn dated(records: Vec<Article>) -> Vec<DatedArticle> {
    records
        .into_iter()
        .filter_map(|article| {
            article
                .published_utc()
                .map(|published| DatedArticle { published, article })
        })
        .collect()
}

pub fn filter_articles(records: Vec<Article>, filter: &ArticleFilter) -> Vec<DatedArticle> {
    let mut rows: Vec<DatedArticle> = dated(records)
        .into_iter()
        .filter(|r| filter.keeps(r))
        .collect();
    rows.sort_by(|a, b| b.published.cmp(&a.published));
    rows
}

/// Earliest and latest publish date among parseable rows.
pub fn date_bounds(records: &[Article]) -> Option<(NaiveDate, NaiveDate)> {
    records
        .iter()
        .filter_map(|a| a.published_utc())
        .map(|dt| dt.date_naive())
        .fold(None, |acc, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/articles", get(list_articles))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ArticlesQuery {
    from: Option<String>,
    to: Option<String>,
    q: Option<String>,
    source: Option<String>,
}

#[derive(Debug, Serialize)]
struct ArticlesResp {
    count: usize,
    min_date: Option<NaiveDate>,
    max_date: Option<NaiveDate>,
    articles: Vec<Article>,
}

fn parse_day(raw: Option<String>, name: &str) -> Result<Option<NaiveDate>, (StatusCode, String)> {
    match non_blank(raw.as_deref()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Some).map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                format!("invalid `{name}` date '{s}', expected YYYY-MM-DD"),
            )
        }),
    }
}

async fn list_articles(
    State(state): State<AppState>,
    Query(q): Query<ArticlesQuery>,
) -> Result<Json<ArticlesResp>, (StatusCode, String)> {
    let filter = ArticleFilter {
        from: parse_day(q.from, "from")?,
        to: parse_day(q.to, "to")?,
        q: q.q,
        source: q.source,
    };

    let records = state.store.load().await.map_err(|e| {
        tracing::error!(error = ?e, "loading stored articles failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to load articles: {e}"),
        )
    })?;
    gauge!("news_store_size").set(records.len() as f64);

    let bounds = date_bounds(&records);
    let rows = filter_articles(records, &filter);
    Ok(Json(ArticlesResp {
        count: rows.len(),
        min_date: bounds.map(|b| b.0),
        max_date: bounds.map(|b| b.1),
        articles: rows.into_iter().map(|r| r.article).collect(),
    }))
}
