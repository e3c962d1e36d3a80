// src/metrics.rs
//! Prometheus exposition for both binaries.
//!
//! The dashboard is long-lived and serves `/metrics` for scraping. The tracker
//! exits after one run, so it pushes its registry to a Pushgateway instead.

use anyhow::{bail, Context, Result};
use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Pushgateway job name used by the tracker.
pub const PUSH_JOB: &str = "news_tracker";

pub struct Metrics {
    handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and describe the news metrics.
    /// Fails if a recorder is already installed in this process.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("installing prometheus recorder")?;
        crate::pipeline::ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Current registry in the text exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// `GET /metrics` for scrapers.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }

    /// Replace this job's group on a Pushgateway at `base_url`.
    pub async fn push(&self, base_url: &str, job: &str) -> Result<()> {
        let url = format!("{}/metrics/job/{job}", base_url.trim_end_matches('/'));
        let resp = reqwest::Client::new()
            .put(&url)
            .timeout(Duration::from_secs(10))
            .header(reqwest::header::CONTENT_TYPE, "text/plain; version=0.0.4")
            .body(self.render())
            .send()
            .await
            .with_context(|| format!("pushing metrics to {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            bail!("pushgateway rejected metrics: {status}, {preview}");
        }
        tracing::debug!(url, "metrics pushed");
        Ok(())
    }
}
