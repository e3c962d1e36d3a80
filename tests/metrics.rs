// tests/metrics.rs
use std::sync::{Arc, Mutex};

use ai_news_tracker::dashboard::{create_router, AppState};
use ai_news_tracker::metrics::{Metrics, PUSH_JOB};
use ai_news_tracker::pipeline::merge_into_store;
use ai_news_tracker::store::MemoryStore;
use ai_news_tracker::{Article, DedupPolicy};
use axum::body::{self, Body};
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::routing::put;
use axum::Router;
use once_cell::sync::Lazy;
use tower::ServiceExt as _;

// Single recorder per test binary
static METRICS: Lazy<Metrics> = Lazy::new(|| Metrics::init().unwrap());

async fn scrape() -> String {
    let req = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let resp = METRICS.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn ingest_pair() {
    let store = MemoryStore::new();
    let batch = vec![
        Article::new("GPT-5 launches", "https://news.example/a"),
        Article::new("Launches GPT-5", "https://news.example/b"),
    ];
    let s = merge_into_store(&store, batch, &DedupPolicy::standard())
        .await
        .unwrap();
    assert_eq!(s.added, 1);
}

#[tokio::test]
async fn metrics_route_exposes_ingest_counters() {
    Lazy::force(&METRICS);
    ingest_pair().await;

    let out = scrape().await;
    assert!(out.contains("news_accepted_total"), "{out}");
    assert!(out.contains("news_rejected_total"), "{out}");
}

#[tokio::test]
async fn dashboard_query_reports_store_size() {
    Lazy::force(&METRICS);
    let store = MemoryStore::with_records(vec![
        Article::new("EU passes landmark AI act", "https://news.example/eu")
            .with_published_at("2025-03-01T09:00:00Z"),
        Article::new("Nvidia unveils new chip", "https://news.example/nv")
            .with_published_at("2025-03-02T10:30:00Z"),
    ]);
    let app = create_router(AppState::new(Arc::new(store)));
    let req = Request::builder()
        .uri("/articles")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let out = scrape().await;
    assert!(out.contains("news_store_size"), "{out}");
}

type Pushed = Arc<Mutex<Vec<(String, String)>>>;

async fn record_push(
    State(seen): State<Pushed>,
    Path(job): Path<String>,
    body: String,
) -> StatusCode {
    seen.lock().unwrap().push((job, body));
    StatusCode::OK
}

#[tokio::test]
async fn push_sends_the_registry_under_the_job_name() {
    Lazy::force(&METRICS);
    ingest_pair().await;

    let seen: Pushed = Arc::default();
    let gateway = Router::new()
        .route("/metrics/job/{job}", put(record_push))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, gateway).await.unwrap() });

    METRICS
        .push(&format!("http://{addr}/"), PUSH_JOB)
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "news_tracker");
    assert!(seen[0].1.contains("news_accepted_total"), "{}", seen[0].1);
}

#[tokio::test]
async fn push_surfaces_gateway_errors() {
    Lazy::force(&METRICS);
    let gateway = Router::new().route(
        "/metrics/job/{job}",
        put(|| async { (StatusCode::BAD_REQUEST, "bad exposition") }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, gateway).await.unwrap() });

    let err = METRICS
        .push(&format!("http://{addr}"), PUSH_JOB)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("400"), "{err}");
}
