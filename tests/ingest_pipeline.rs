// tests/ingest_pipeline.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use ai_news_tracker::fetch::NewsProvider;
use ai_news_tracker::pipeline::{fetch_all, merge_into_store, run_once};
use ai_news_tracker::store::{ArticleStore, CsvStore, MemoryStore};
use ai_news_tracker::{Article, DedupPolicy};

/// Returns canned titles per term; terms listed in `fail` error out.
struct MockProvider {
    fail: Vec<&'static str>,
    seen: Mutex<Vec<String>>,
}

impl MockProvider {
    fn new() -> Self {
        Self {
            fail: Vec::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn failing(fail: Vec<&'static str>) -> Self {
        Self {
            fail,
            ..Self::new()
        }
    }
}

#[async_trait]
impl NewsProvider for MockProvider {
    async fn fetch(&self, term: &str) -> Result<Vec<Article>> {
        self.seen.lock().unwrap().push(term.to_string());
        if self.fail.iter().any(|f| *f == term) {
            return Err(anyhow!("401 Unauthorized"));
        }
        let titles: &[&str] = match term {
            "ai" => &["GPT-5 launches", "Launches GPT-5", "Robots learn to dance"],
            "chips" => &["Nvidia unveils new chip"],
            _ => &[],
        };
        Ok(titles
            .iter()
            .map(|t| {
                Article::new(*t, format!("https://news.example/{}", t.len()))
                    .with_published_at("2025-04-01T00:00:00Z")
                    .with_source("Mock")
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "Mock"
    }
}

fn terms(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn first_run_saves_unique_articles() {
    let p = MockProvider::new();
    let store = MemoryStore::new();
    let s = run_once(
        &p,
        &terms(&["ai", "chips"]),
        Duration::ZERO,
        &store,
        &DedupPolicy::standard(),
    )
    .await
    .unwrap();

    assert_eq!(s.fetched, 4);
    assert_eq!(s.added, 3);
    assert_eq!(s.rejected, 1);
    assert_eq!(s.total, 3);
    assert!(s.saved);
    assert_eq!(store.save_count(), 1);
}

#[tokio::test]
async fn second_identical_run_skips_save() {
    let p = MockProvider::new();
    let store = MemoryStore::new();
    let t = terms(&["ai", "chips"]);
    let policy = DedupPolicy::standard();

    run_once(&p, &t, Duration::ZERO, &store, &policy).await.unwrap();
    let before = store.snapshot();

    let s = run_once(&p, &t, Duration::ZERO, &store, &policy).await.unwrap();
    assert_eq!(s.added, 0);
    assert!(!s.saved);
    assert_eq!(s.total, before.len());
    assert_eq!(store.save_count(), 1, "save must not run when nothing is new");
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn failing_term_does_not_stop_the_run() {
    let p = MockProvider::failing(vec!["ai"]);
    let store = MemoryStore::new();
    let s = run_once(
        &p,
        &terms(&["ai", "chips"]),
        Duration::ZERO,
        &store,
        &DedupPolicy::standard(),
    )
    .await
    .unwrap();

    assert_eq!(s.failed_terms, 1);
    assert_eq!(s.fetched, 1);
    assert_eq!(s.added, 1);
    assert_eq!(*p.seen.lock().unwrap(), terms(&["ai", "chips"]));
}

#[tokio::test]
async fn all_terms_failing_reports_nothing_new() {
    let p = MockProvider::failing(vec!["ai", "chips"]);
    let store = MemoryStore::new();
    let s = run_once(
        &p,
        &terms(&["ai", "chips"]),
        Duration::ZERO,
        &store,
        &DedupPolicy::standard(),
    )
    .await
    .unwrap();
    assert_eq!(s.fetched, 0);
    assert!(!s.saved);
    assert_eq!(store.save_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn pause_is_only_between_terms() {
    let p = MockProvider::new();
    let t0 = tokio::time::Instant::now();
    let (batch, failed) = fetch_all(&p, &terms(&["ai", "chips", "x"]), Duration::from_secs(2)).await;
    assert_eq!(batch.len(), 4);
    assert_eq!(failed, 0);
    let waited = t0.elapsed();
    assert!(waited >= Duration::from_secs(4) && waited < Duration::from_secs(5), "{waited:?}");
}

#[tokio::test]
async fn unreadable_csv_is_treated_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("news.csv");
    std::fs::write(&path, [0xff, 0xfe, 0xfd]).unwrap();
    let store = CsvStore::new(&path);

    let batch = vec![Article::new("Quantum sensors ship", "https://news.example/q")];
    let s = merge_into_store(&store, batch, &DedupPolicy::standard())
        .await
        .unwrap();
    assert!(s.saved);
    assert_eq!(s.total, 1);
    assert_eq!(store.load().await.unwrap().len(), 1);
}

#[tokio::test]
async fn pre_existing_near_duplicates_are_left_alone() {
    let store = MemoryStore::with_records(vec![
        Article::new("GPT-5 launches", "https://news.example/1"),
        Article::new("Launches GPT-5", "https://news.example/2"),
    ]);
    let batch = vec![Article::new("Weather turns cold", "https://news.example/3")];
    let s = merge_into_store(&store, batch, &DedupPolicy::standard())
        .await
        .unwrap();
    assert_eq!(s.total, 3);
    let titles: Vec<_> = store.snapshot().into_iter().map(|a| a.title).collect();
    assert_eq!(titles, ["GPT-5 launches", "Launches GPT-5", "Weather turns cold"]);
}
