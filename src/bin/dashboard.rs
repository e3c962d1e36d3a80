//! news-dashboard: serves the stored articles over HTTP.

use std::sync::Arc;

use ai_news_tracker::dashboard::{create_router, AppState};
use ai_news_tracker::metrics::Metrics;
use ai_news_tracker::{CsvStore, TrackerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    ai_news_tracker::init_tracing();

    let cfg = TrackerConfig::load_default()?;
    let metrics = Metrics::init()?;

    let state = AppState::new(Arc::new(CsvStore::new(&cfg.csv_path)));
    let app = create_router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.dashboard_addr).await?;
    tracing::info!(addr = %cfg.dashboard_addr, csv = %cfg.csv_path.display(), "dashboard listening");
    axum::serve(listener, app).await?;
    Ok(())
}
