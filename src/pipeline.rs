// src/pipeline.rs
//! One ingestion run: fetch every term, dedup against storage, persist.

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::time::Duration;
use tracing::{info, warn};

use crate::article::Article;
use crate::dedup::{ingest, DedupPolicy};
use crate::fetch::NewsProvider;
use crate::similarity::TitleScorer;
use crate::store::{titles_of, ArticleStore};

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_runs_total", "Completed ingestion runs.");
        describe_counter!("news_fetched_total", "Articles returned by the search API.");
        describe_counter!("news_fetch_errors_total", "Failed search requests.");
        describe_counter!("news_accepted_total", "Articles appended to storage.");
        describe_counter!("news_rejected_total", "Articles dropped as near-duplicates.");
        describe_histogram!("news_fetch_ms", "Search request time in milliseconds.");
        describe_gauge!("news_store_size", "Records in storage after the last run.");
    });
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub added: usize,
    pub rejected: usize,
    pub failed_terms: usize,
    /// Records in storage after the run (or before it, when nothing was saved).
    pub total: usize,
    pub saved: bool,
}

/// Query the provider once per term, in order. A failed term contributes
/// nothing; the remaining terms still run. `pause` is slept between calls.
pub async fn fetch_all(
    provider: &dyn NewsProvider,
    terms: &[String],
    pause: Duration,
) -> (Vec<Article>, usize) {
    let mut batch = Vec::new();
    let mut failed = 0usize;
    for (i, term) in terms.iter().enumerate() {
        if i > 0 && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
        match provider.fetch(term).await {
            Ok(mut v) => {
                info!(provider = provider.name(), term = %term, count = v.len(), "fetched");
                batch.append(&mut v);
            }
            Err(e) => {
                warn!(error = ?e, provider = provider.name(), term = %term, "fetch failed; treating as zero articles");
                counter!("news_fetch_errors_total").increment(1);
                failed += 1;
            }
        }
    }
    (batch, failed)
}

/// Merge `batch` into `store`. Storage that cannot be read is treated as
/// empty; `save` is skipped entirely when nothing was accepted.
pub async fn merge_into_store<S: TitleScorer>(
    store: &dyn ArticleStore,
    batch: Vec<Article>,
    policy: &DedupPolicy<S>,
) -> Result<RunSummary> {
    let fetched = batch.len();
    let mut existing = match store.load().await {
        Ok(v) => v,
        Err(e) => {
            warn!(error = ?e, "stored articles unreadable; continuing as if storage were empty");
            Vec::new()
        }
    };

    let outcome = ingest(&titles_of(&existing), batch, policy);
    counter!("news_rejected_total").increment(outcome.rejected as u64);

    let mut summary = RunSummary {
        fetched,
        added: outcome.accepted.len(),
        rejected: outcome.rejected,
        ..RunSummary::default()
    };

    if outcome.accepted.is_empty() {
        summary.total = existing.len();
        return Ok(summary);
    }

    existing.extend(outcome.accepted);
    store.save(&existing).await?;
    counter!("news_accepted_total").increment(summary.added as u64);
    summary.total = existing.len();
    summary.saved = true;
    Ok(summary)
}

/// Full run: fetch, merge, report.
pub async fn run_once<S: TitleScorer>(
    provider: &dyn NewsProvider,
    terms: &[String],
    pause: Duration,
    store: &dyn ArticleStore,
    policy: &DedupPolicy<S>,
) -> Result<RunSummary> {
    ensure_metrics_described();

    let (batch, failed_terms) = fetch_all(provider, terms, pause).await;
    let mut summary = merge_into_store(store, batch, policy).await?;
    summary.failed_terms = failed_terms;

    counter!("news_runs_total").increment(1);
    gauge!("news_store_size").set(summary.total as f64);

    if summary.saved {
        info!(
            fetched = summary.fetched,
            added = summary.added,
            rejected = summary.rejected,
            total = summary.total,
            "saved new articles"
        );
    } else {
        info!(
            fetched = summary.fetched,
            rejected = summary.rejected,
            failed_terms = summary.failed_terms,
            "no new unique articles"
        );
    }
    Ok(summary)
}
