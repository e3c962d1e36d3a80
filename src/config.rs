// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::dedup::{DedupPolicy, DEFAULT_THRESHOLD};
use crate::similarity::{SimilarityMetric, TokenSortRatio};

pub const ENV_CONFIG_PATH: &str = "NEWS_TRACKER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/news_tracker.toml";

pub const ENV_API_KEY: &str = "GNEWS_API_KEY";
pub const ENV_CSV_PATH: &str = "NEWS_CSV_PATH";
pub const ENV_THRESHOLD: &str = "DEDUP_THRESHOLD";
pub const ENV_DASHBOARD_ADDR: &str = "DASHBOARD_ADDR";
pub const ENV_METRICS_PUSH_URL: &str = "METRICS_PUSH_URL";

pub const DEFAULT_BASE_URL: &str = "https://gnews.io/api/v4";
pub const DEFAULT_TERM: &str = "artificial intelligence";

fn default_terms() -> Vec<String> {
    vec![DEFAULT_TERM.to_string()]
}
fn default_lang() -> String {
    "en".to_string()
}
fn default_max() -> u32 {
    10
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_csv_path() -> PathBuf {
    PathBuf::from("data/news_data.csv")
}
fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}
fn default_pause_ms() -> u64 {
    1_000
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_dashboard_addr() -> String {
    "127.0.0.1:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// "ENV" (or absent) means: read from GNEWS_API_KEY
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_terms")]
    pub search_terms: Vec<String>,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_max")]
    pub max_per_term: u32,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
    /// Duplicate threshold on the 0–100 similarity scale (inclusive).
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f64,
    #[serde(default)]
    pub similarity_metric: SimilarityMetric,
    /// Pause between consecutive search requests.
    #[serde(default = "default_pause_ms")]
    pub request_pause_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_dashboard_addr")]
    pub dashboard_addr: String,
    /// Pushgateway base URL; the tracker pushes its run metrics there on exit.
    #[serde(default)]
    pub metrics_push_url: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            search_terms: default_terms(),
            lang: default_lang(),
            max_per_term: default_max(),
            base_url: default_base_url(),
            csv_path: default_csv_path(),
            similarity_threshold: default_threshold(),
            similarity_metric: SimilarityMetric::default(),
            request_pause_ms: default_pause_ms(),
            request_timeout_secs: default_timeout_secs(),
            dashboard_addr: default_dashboard_addr(),
            metrics_push_url: None,
        }
    }
}

impl TrackerConfig {
    /// Parse TOML content, then apply env overrides and sanitize.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: TrackerConfig = toml::from_str(s).context("parsing tracker config toml")?;
        cfg.finish()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading tracker config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Resolution order:
    /// 1) $NEWS_TRACKER_CONFIG (must exist)
    /// 2) config/news_tracker.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
        if fallback.exists() {
            return Self::load_from(&fallback);
        }
        Self::default().finish()
    }

    pub fn request_pause(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_pause_ms)
    }

    pub fn dedup_policy(&self) -> DedupPolicy<TokenSortRatio> {
        DedupPolicy::token_sort(self.similarity_threshold, self.similarity_metric)
    }

    fn finish(mut self) -> Result<Self> {
        self.apply_env();
        self.sanitize();
        Ok(self)
    }

    fn apply_env(&mut self) {
        let placeholder = self
            .api_key
            .as_deref()
            .map_or(true, |k| k.trim().is_empty() || k.trim().eq_ignore_ascii_case("env"));
        if placeholder {
            self.api_key = env::var(ENV_API_KEY).ok().filter(|k| !k.trim().is_empty());
        }
        if let Ok(p) = env::var(ENV_CSV_PATH) {
            if !p.trim().is_empty() {
                self.csv_path = PathBuf::from(p.trim());
            }
        }
        if let Some(t) = env::var(ENV_THRESHOLD)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
        {
            self.similarity_threshold = t;
        }
        if let Ok(addr) = env::var(ENV_DASHBOARD_ADDR) {
            if !addr.trim().is_empty() {
                self.dashboard_addr = addr.trim().to_string();
            }
        }
        if let Ok(url) = env::var(ENV_METRICS_PUSH_URL) {
            self.metrics_push_url = Some(url);
        }
    }

    fn sanitize(&mut self) {
        if !self.similarity_threshold.is_finite() {
            self.similarity_threshold = default_threshold();
        }
        self.similarity_threshold = self.similarity_threshold.clamp(0.0, 100.0);
        self.search_terms = clean_terms(std::mem::take(&mut self.search_terms));
        if self.search_terms.is_empty() {
            self.search_terms = default_terms();
        }
        if self.max_per_term == 0 {
            self.max_per_term = default_max();
        }
        self.metrics_push_url = self
            .metrics_push_url
            .take()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());
    }
}

// Trim, drop blanks, drop repeats; first occurrence keeps its position.
fn clean_terms(items: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && seen.insert(t.to_ascii_lowercase()) {
            out.push(t.to_string());
        }
    }
    out
}
