//! news-tracker: one fetch run.
//! Queries the news search API for every configured term, drops titles that
//! are near-duplicates of stored ones, and appends the rest to the CSV store.

use ai_news_tracker::fetch::GNewsProvider;
use ai_news_tracker::metrics::{Metrics, PUSH_JOB};
use ai_news_tracker::pipeline;
use ai_news_tracker::{CsvStore, TrackerConfig};
use std::process::ExitCode;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    ai_news_tracker::init_tracing();

    let cfg = match TrackerConfig::load_default() {
        Ok(c) => c,
        Err(e) => {
            error!(error = ?e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(
        terms = ?cfg.search_terms,
        csv = %cfg.csv_path.display(),
        threshold = cfg.similarity_threshold,
        "news tracker run starting"
    );

    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            warn!(error = ?e, "metrics recorder unavailable; run metrics will not be exported");
            None
        }
    };

    let provider = GNewsProvider::from_config(&cfg);
    let store = CsvStore::new(&cfg.csv_path);
    let policy = cfg.dedup_policy();

    let result =
        pipeline::run_once(&provider, &cfg.search_terms, cfg.request_pause(), &store, &policy).await;

    if let (Some(m), Some(url)) = (&metrics, cfg.metrics_push_url.as_deref()) {
        if let Err(e) = m.push(url, PUSH_JOB).await {
            warn!(error = ?e, "metrics push failed");
        }
    }

    match result {
        Ok(summary) => {
            if summary.saved {
                println!(
                    "Fetched {} articles, added {} new; {} total in {}",
                    summary.fetched,
                    summary.added,
                    summary.total,
                    store.path().display()
                );
            } else {
                println!(
                    "Fetched {} articles; no new unique articles",
                    summary.fetched
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = ?e, "saving articles failed");
            ExitCode::FAILURE
        }
    }
}
