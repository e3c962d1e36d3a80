// src/store.rs
//! Persisted article table.
//!
//! `CsvStore` keeps the table as a headered CSV file with the columns in
//! [`COLUMNS`] order. Columns are matched by header name on load, so files
//! written by older versions with fewer columns still load (missing cells are
//! empty). Columns this version does not know are carried through on each
//! row and written back after the known ones.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::article::{Article, COLUMNS};

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// All stored records in insertion order. Absent storage is empty, not an error.
    async fn load(&self) -> Result<Vec<Article>>;
    /// Replace the stored records.
    async fn save(&self, records: &[Article]) -> Result<()>;
}

pub fn titles_of(records: &[Article]) -> Vec<String> {
    records.iter().map(|a| a.title.clone()).collect()
}

#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Decode a CSV table (with header) into records. Cells under headers outside
/// [`COLUMNS`] land in `Article::extra`.
pub fn read_csv(content: &str) -> Result<Vec<Article>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers = reader.headers().context("reading csv header")?.clone();
    let extra_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !COLUMNS.contains(h))
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut out = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let record = row.with_context(|| format!("reading csv row {}", i + 1))?;
        let mut article: Article = record
            .deserialize(Some(&headers))
            .with_context(|| format!("decoding csv row {}", i + 1))?;
        article.extra = extra_cols
            .iter()
            .map(|(idx, name)| (name.clone(), record.get(*idx).unwrap_or_default().to_string()))
            .collect();
        out.push(article);
    }
    Ok(out)
}

/// Header for `records`: [`COLUMNS`], then every extra column in first-seen order.
pub fn header_for(records: &[Article]) -> Vec<String> {
    let mut header: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
    for (name, _) in records.iter().flat_map(|a| a.extra.iter()) {
        if !header.contains(name) {
            header.push(name.clone());
        }
    }
    header
}

/// Encode records as a CSV table with the full header. Rows lacking an extra
/// column get an empty cell.
pub fn write_csv(records: &[Article]) -> Result<String> {
    let header = header_for(records);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(&header)?;
    for a in records {
        let mut row: Vec<&str> = vec![
            a.title.as_str(),
            a.description.as_deref().unwrap_or_default(),
            a.url.as_str(),
            a.published_at.as_str(),
            a.source.as_str(),
            a.image.as_deref().unwrap_or_default(),
        ];
        row.extend(
            header[COLUMNS.len()..]
                .iter()
                .map(|col| a.extra_value(col).unwrap_or_default()),
        );
        writer.write_record(&row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("flushing csv writer: {}", e.error()))?;
    String::from_utf8(bytes).context("csv output is not utf-8")
}

#[async_trait]
impl ArticleStore for CsvStore {
    async fn load(&self) -> Result<Vec<Article>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        read_csv(&content).with_context(|| format!("parsing {}", self.path.display()))
    }

    async fn save(&self, records: &[Article]) -> Result<()> {
        let body = write_csv(records)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        // write-then-rename so readers never see a half-written table
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

/// In-process store. Counts saves so callers can assert a run skipped persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Article>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Article>) -> Self {
        Self {
            records: Mutex::new(records),
            saves: Mutex::new(0),
        }
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> Vec<Article> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn load(&self) -> Result<Vec<Article>> {
        Ok(self.snapshot())
    }

    async fn save(&self, records: &[Article]) -> Result<()> {
        *self.records.lock().unwrap_or_else(|e| e.into_inner()) = records.to_vec();
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}
