// src/article.rs
//! The article record shared by the fetcher, the ingestor, the store and the
//! query service. Field names on the wire and in the CSV header are the
//! camel-cased ones the news API uses.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Column order of the persisted table.
pub const COLUMNS: [&str; 6] = ["title", "description", "url", "publishedAt", "source", "image"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, deserialize_with = "de_text")]
    pub title: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    pub url: String,
    #[serde(rename = "publishedAt", default, deserialize_with = "de_text")]
    pub published_at: String,
    #[serde(default, deserialize_with = "de_text")]
    pub source: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub image: Option<String>,
    /// Cells of stored columns outside [`COLUMNS`], as (header, value), kept so
    /// a rewrite of the table does not lose them.
    #[serde(skip)]
    pub extra: Vec<(String, String)>,
}

impl Article {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, d: impl Into<String>) -> Self {
        self.description = non_empty(d.into());
        self
    }

    pub fn with_published_at(mut self, ts: impl Into<String>) -> Self {
        self.published_at = ts.into();
        self
    }

    pub fn with_source(mut self, s: impl Into<String>) -> Self {
        self.source = s.into();
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image = non_empty(url.into());
        self
    }

    pub fn with_extra(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((column.into(), value.into()));
        self
    }

    pub fn extra_value(&self, column: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }

    /// Publish time as UTC, if the stored string is parseable.
    pub fn published_utc(&self) -> Option<DateTime<Utc>> {
        parse_published(&self.published_at)
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Re-emit a parseable timestamp as `YYYY-MM-DDTHH:MM:SSZ`; anything else is
/// returned untouched.
pub fn canonical_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(dt) => dt
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        Err(_) => raw.to_string(),
    }
}

pub(crate) fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

// null / missing cells collapse to "" instead of failing the row
fn de_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn de_opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(d)?.and_then(non_empty))
}
