//! Backend-generic conformance tests for `ForecastStore` implementations.
//!
//! The suite is parameterised over a store factory so every backend runs
//! the same assertions; backend-specific behavior (file reload, corrupt
//! input) gets its own tests below.

use std::future::Future;

use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use demandcast_core::record::format_timestamp;
use demandcast_core::{ForecastRecord, HistoryQuery};
use demandcast_storage::{ForecastStore, JsonlStore, MemoryStore};

/// Fixed evaluation instant all suite records are anchored to.
fn now() -> OffsetDateTime {
    datetime!(2023-06-15 12:00 UTC)
}

fn record(filename: &str, age: Duration) -> ForecastRecord {
    let mut metadata = serde_json::Map::new();
    metadata.insert("model".into(), serde_json::json!("prophet"));
    ForecastRecord {
        filename: filename.into(),
        uploaded_at: format_timestamp(now() - age),
        historical: vec![],
        predictions: vec![],
        metadata,
    }
}

async fn run_store_suite<S, F, Fut>(factory: F)
where
    S: ForecastStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    insert_assigns_distinct_ids(factory().await).await;
    find_orders_most_recent_first(factory().await).await;
    find_skips_and_limits(factory().await).await;
    day_window_and_search_filtering(factory().await).await;
    find_by_id_roundtrip(factory().await).await;
}

async fn insert_assigns_distinct_ids<S: ForecastStore>(store: S) {
    let a = store.insert(record("a.csv", Duration::hours(1))).await.unwrap();
    let b = store.insert(record("a.csv", Duration::hours(1))).await.unwrap();
    assert_ne!(a.id, b.id, "identical uploads must still get distinct ids");
    assert_eq!(a.record.filename, "a.csv");
}

async fn find_orders_most_recent_first<S: ForecastStore>(store: S) {
    // Inserted oldest-first to prove ordering comes from uploadedAt,
    // not insertion order.
    store.insert(record("old.csv", Duration::hours(30))).await.unwrap();
    store.insert(record("newest.csv", Duration::hours(1))).await.unwrap();
    store.insert(record("middle.csv", Duration::hours(10))).await.unwrap();

    let filter = HistoryQuery::default().filter(now());
    let page = store.find(&filter, 0, 10).await.unwrap();
    let names: Vec<&str> = page.iter().map(|s| s.record.filename.as_str()).collect();
    assert_eq!(names, vec!["newest.csv", "middle.csv", "old.csv"]);
}

async fn find_skips_and_limits<S: ForecastStore>(store: S) {
    for i in 0..25 {
        store
            .insert(record(&format!("f{:02}.csv", i), Duration::minutes(i)))
            .await
            .unwrap();
    }

    let query = HistoryQuery::new(None, None, Some(2), Some(10));
    let filter = query.filter(now());
    let page = store.find(&filter, query.skip(), query.limit).await.unwrap();

    // Records 11-20 by recency: f00 is the newest, so page 2 starts at f10.
    assert_eq!(page.len(), 10);
    assert_eq!(page[0].record.filename, "f10.csv");
    assert_eq!(page[9].record.filename, "f19.csv");
    assert_eq!(store.count(&filter).await.unwrap(), 25);
}

async fn day_window_and_search_filtering<S: ForecastStore>(store: S) {
    store.insert(record("ABCdata.csv", Duration::hours(1))).await.unwrap();
    store.insert(record("sales.csv", Duration::hours(2))).await.unwrap();
    store.insert(record("abc-old.csv", Duration::hours(25))).await.unwrap();

    // days=1 never returns anything older than 24h.
    let filter = HistoryQuery::new(Some(1), None, None, None).filter(now());
    let names: Vec<String> = store
        .find(&filter, 0, 10)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.record.filename)
        .collect();
    assert_eq!(names, vec!["ABCdata.csv", "sales.csv"]);

    // Case-insensitive filename search.
    let filter = HistoryQuery::new(None, Some("abc".into()), None, None).filter(now());
    let found = store.find(&filter, 0, 10).await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(store.count(&filter).await.unwrap(), 2);

    // Model-name search reaches metadata.
    let filter = HistoryQuery::new(None, Some("prophet".into()), None, None).filter(now());
    assert_eq!(store.count(&filter).await.unwrap(), 3);
}

async fn find_by_id_roundtrip<S: ForecastStore>(store: S) {
    let stored = store.insert(record("a.csv", Duration::hours(1))).await.unwrap();

    let found = store.find_by_id(&stored.id).await.unwrap();
    assert_eq!(found, Some(stored));
    assert_eq!(store.find_by_id("no-such-id").await.unwrap(), None);
}

#[tokio::test]
async fn memory_store_conformance() {
    run_store_suite(|| async { MemoryStore::new() }).await;
}

#[tokio::test]
async fn jsonl_store_conformance() {
    let dir = tempfile::tempdir().unwrap();
    let counter = std::sync::atomic::AtomicU32::new(0);
    let dir_path = dir.path().to_path_buf();

    run_store_suite(|| {
        let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let path = dir_path.join(format!("store-{}.jsonl", n));
        async move { JsonlStore::open(path).await.unwrap() }
    })
    .await;
}

#[tokio::test]
async fn jsonl_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("forecasts.jsonl");

    let id = {
        let store = JsonlStore::open(&path).await.unwrap();
        store.insert(record("a.csv", Duration::hours(1))).await.unwrap();
        let stored = store.insert(record("b.csv", Duration::hours(2))).await.unwrap();
        stored.id
    };

    let store = JsonlStore::open(&path).await.unwrap();
    let filter = HistoryQuery::default().filter(now());
    assert_eq!(store.count(&filter).await.unwrap(), 2);
    let found = store.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(found.record.filename, "b.csv");

    // New inserts after reopen must not collide with reloaded ids.
    let fresh = store.insert(record("b.csv", Duration::hours(2))).await.unwrap();
    assert_ne!(fresh.id, id);
}

#[tokio::test]
async fn jsonl_store_skips_corrupt_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("forecasts.jsonl");

    let good = serde_json::to_string(&demandcast_storage::StoredForecast {
        id: "deadbeef00000000".into(),
        record: record("good.csv", Duration::hours(1)),
    })
    .unwrap();
    std::fs::write(&path, format!("{}\nnot json at all\n\n", good)).unwrap();

    let store = JsonlStore::open(&path).await.unwrap();
    let filter = HistoryQuery::default().filter(now());
    assert_eq!(store.count(&filter).await.unwrap(), 1);
}
