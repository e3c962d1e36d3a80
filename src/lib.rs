// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod article;
pub mod config;
pub mod dashboard;
pub mod dedup;
pub mod fetch;
pub mod metrics;
pub mod pipeline;
pub mod similarity;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::article::Article;
pub use crate::config::TrackerConfig;
pub use crate::dedup::{ingest, DedupPolicy, IngestOutcome};
pub use crate::store::{ArticleStore, CsvStore, MemoryStore};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///   - filter from RUST_LOG, default `info`
///   - LOG_FORMAT=json switches to JSON lines
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}
