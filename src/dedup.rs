// src/dedup.rs
//! Incremental fuzzy deduplication of a fetched batch against stored titles.
//!
//! - Each candidate is scored against every title known so far: the stored
//!   ones plus the ones accepted earlier in the same batch.
//! - A candidate whose best score reaches the threshold (inclusive) is dropped.
//! - Accepted titles join the comparison set immediately, so the batch order
//!   matters.
//!
//! Stored titles are never compared with each other; near-duplicates that are
//! already in storage stay there.

use crate::article::Article;
use crate::similarity::{SimilarityMetric, TitleScorer, TokenSortRatio};

pub const DEFAULT_THRESHOLD: f64 = 50.0;

/// Threshold plus the scorer used to compare titles.
#[derive(Debug, Clone)]
pub struct DedupPolicy<S = TokenSortRatio> {
    pub threshold: f64,
    pub scorer: S,
}

impl DedupPolicy<TokenSortRatio> {
    pub fn token_sort(threshold: f64, metric: SimilarityMetric) -> Self {
        Self {
            threshold,
            scorer: TokenSortRatio::new(metric),
        }
    }

    /// Threshold 50 with the indel token-sort-ratio.
    pub fn standard() -> Self {
        Self::token_sort(DEFAULT_THRESHOLD, SimilarityMetric::Indel)
    }
}

impl Default for DedupPolicy<TokenSortRatio> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<S: TitleScorer> DedupPolicy<S> {
    pub fn new(threshold: f64, scorer: S) -> Self {
        Self { threshold, scorer }
    }

    /// Highest score of `title` against `known`; `None` when `known` is empty.
    pub fn max_similarity(&self, title: &str, known: &[String]) -> Option<f64> {
        known
            .iter()
            .map(|k| self.scorer.score(title, k))
            .fold(None, |best, s| Some(best.map_or(s, |b: f64| b.max(s))))
    }

    pub fn is_duplicate(&self, title: &str, known: &[String]) -> bool {
        self.max_similarity(title, known)
            .is_some_and(|s| s >= self.threshold)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestOutcome {
    pub accepted: Vec<Article>,
    pub updated_titles: Vec<String>,
    pub rejected: usize,
}

/// Decide which records of `batch` are new enough to keep.
///
/// Pure: the caller loads `existing_titles` and persists `accepted`.
/// `updated_titles.len() == existing_titles.len() + accepted.len()` always holds.
pub fn ingest<S: TitleScorer>(
    existing_titles: &[String],
    batch: Vec<Article>,
    policy: &DedupPolicy<S>,
) -> IngestOutcome {
    let seed = IngestOutcome {
        accepted: Vec::with_capacity(batch.len()),
        updated_titles: existing_titles.to_vec(),
        rejected: 0,
    };

    batch.into_iter().fold(seed, |mut acc, article| {
        if policy.is_duplicate(&article.title, &acc.updated_titles) {
            tracing::debug!(target: "dedup", title = %article.title, "rejected near-duplicate");
            acc.rejected += 1;
        } else {
            acc.updated_titles.push(article.title.clone());
            acc.accepted.push(article);
        }
        acc
    })
}
