//! Contract tests for DocumentStore.
//!
//! Each check runs against the in-memory fake and against SurrealDB
//! (`mem://`). Any conforming implementation must pass these.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use recall_state::fakes::{ManualClock, MemoryDocumentStore};
use recall_state::*;
use serde_json::json;

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 2, 0, 0).unwrap()
}

fn users() -> CollectionPath {
    CollectionPath::root("users").unwrap()
}

fn entries(user: &str) -> CollectionPath {
    users().doc(user).unwrap().collection("memory_entries").unwrap()
}

fn facts(user: &str) -> CollectionPath {
    users().doc(user).unwrap().collection("key_facts").unwrap()
}

// ===========================================================================
// Shared checks
// ===========================================================================

async fn check_create_then_get(store: &dyn DocumentStore) {
    let created = store
        .create(
            &entries("alice"),
            DocWrite::new()
                .set("userMessage", "hi")
                .server_timestamp("timestamp"),
        )
        .await
        .unwrap();

    let loaded = store.get(&created.path).await.unwrap().expect("exists");
    assert_eq!(loaded.get_str("userMessage"), Some("hi"));
    assert_eq!(loaded.get_timestamp("timestamp"), Some(store.now()));
}

async fn check_get_missing(store: &dyn DocumentStore) {
    let missing = facts("alice").doc("nothing").unwrap();
    assert!(store.get(&missing).await.unwrap().is_none());
}

async fn check_ordered_query_with_offset(store: &dyn DocumentStore, clock: &ManualClock) {
    for i in 0..5 {
        store
            .create(
                &entries("bob"),
                DocWrite::new().set("n", i).server_timestamp("timestamp"),
            )
            .await
            .unwrap();
        clock.advance(Duration::seconds(1));
    }
    // No timestamp: excluded from ordered queries.
    store
        .create(&entries("bob"), DocWrite::new().set("n", 99))
        .await
        .unwrap();

    let newest = store
        .query(
            &entries("bob"),
            &Query::all().order_by(OrderBy::desc("timestamp")).limit(2),
        )
        .await
        .unwrap();
    let ns: Vec<i64> = newest.iter().map(|d| d.get("n").unwrap().as_i64().unwrap()).collect();
    assert_eq!(ns, vec![4, 3]);

    let tail = store
        .query(
            &entries("bob"),
            &Query::all().order_by(OrderBy::desc("timestamp")).offset(3),
        )
        .await
        .unwrap();
    let ns: Vec<i64> = tail.iter().map(|d| d.get("n").unwrap().as_i64().unwrap()).collect();
    assert_eq!(ns, vec![1, 0]);

    let everything = store.query(&entries("bob"), &Query::all()).await.unwrap();
    assert_eq!(everything.len(), 6);
}

async fn check_filter_gte(store: &dyn DocumentStore, clock: &ManualClock) {
    let base = clock.now();
    for offset in [10, 5, 1] {
        clock.set(base - Duration::days(offset));
        store
            .create(
                &entries("carol"),
                DocWrite::new().set("age", offset).server_timestamp("timestamp"),
            )
            .await
            .unwrap();
    }
    clock.set(base);

    let cutoff = format_timestamp(base - Duration::days(7));
    let recent = store
        .query(
            &entries("carol"),
            &Query::all()
                .filter(Filter::gte("timestamp", cutoff))
                .order_by(OrderBy::desc("timestamp")),
        )
        .await
        .unwrap();
    let ages: Vec<i64> = recent.iter().map(|d| d.get("age").unwrap().as_i64().unwrap()).collect();
    assert_eq!(ages, vec![1, 5]);
}

async fn check_merge_upsert_keeps_other_fields(store: &dyn DocumentStore) {
    let path = facts("dave").doc("diet").unwrap();
    store
        .put(&path, DocWrite::new().set("value", "omnivore").set("source", "onboarding"))
        .await
        .unwrap();

    let merged = store
        .merge_upsert(&path, DocWrite::new().set("value", "vegan"))
        .await
        .unwrap();

    assert_eq!(merged.get_str("value"), Some("vegan"));
    assert_eq!(merged.get_str("source"), Some("onboarding"));
}

async fn check_merge_upsert_creates(store: &dyn DocumentStore) {
    let path = facts("erin").doc("city").unwrap();
    let created = store
        .merge_upsert(&path, DocWrite::new().set("value", "Paris"))
        .await
        .unwrap();
    assert_eq!(created.get_str("value"), Some("Paris"));
    assert!(store.get(&path).await.unwrap().is_some());
}

async fn check_put_replaces(store: &dyn DocumentStore) {
    let path = facts("frank").doc("pet").unwrap();
    store
        .put(&path, DocWrite::new().set("value", "cat").set("name", "Tom"))
        .await
        .unwrap();
    store
        .put(&path, DocWrite::new().set("value", "dog"))
        .await
        .unwrap();

    let loaded = store.get(&path).await.unwrap().unwrap();
    assert_eq!(loaded.get_str("value"), Some("dog"));
    assert!(loaded.get("name").is_none());
}

async fn check_batch_delete(store: &dyn DocumentStore) {
    let mut paths = Vec::new();
    for i in 0..3 {
        let doc = store
            .create(&entries("gina"), DocWrite::new().set("n", i))
            .await
            .unwrap();
        paths.push(doc.path);
    }
    let ghost = entries("gina").doc("never-written").unwrap();

    assert_eq!(store.batch_delete(&[]).await.unwrap(), 0);
    let deleted = store
        .batch_delete(&[paths[0].clone(), paths[1].clone(), ghost])
        .await
        .unwrap();
    assert_eq!(deleted, 2);

    let left = store.query(&entries("gina"), &Query::all()).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].path, paths[2]);
}

async fn check_array_append(store: &dyn DocumentStore) {
    let user = users().doc("hank").unwrap();
    store
        .array_append(
            &user,
            "learnedPreferences",
            DocWrite::new().set("preferences", json!({"tone": "casual"})),
        )
        .await
        .unwrap();
    let second = store
        .array_append(
            &user,
            "learnedPreferences",
            DocWrite::new()
                .set("preferences", json!({"tone": "formal"}))
                .server_timestamp("learnedAt"),
        )
        .await
        .unwrap();
    assert_eq!(second["learnedAt"], json!(format_timestamp(store.now())));

    let doc = store.get(&user).await.unwrap().unwrap();
    let items = doc.get("learnedPreferences").unwrap().as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["preferences"]["tone"], "casual");
    assert_eq!(items[1]["preferences"]["tone"], "formal");
}

async fn check_list_top_level_keys(store: &dyn DocumentStore) {
    // A user document, and a user known only through a nested collection.
    store
        .put(&users().doc("ivy").unwrap(), DocWrite::new().set("plan", "free"))
        .await
        .unwrap();
    store
        .create(&entries("jack"), DocWrite::new().set("n", 1))
        .await
        .unwrap();
    store
        .create(&facts("jack"), DocWrite::new().set("value", "x"))
        .await
        .unwrap();

    let mut keys = store.list_top_level_keys("users").await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["ivy".to_string(), "jack".to_string()]);
    assert!(store.list_top_level_keys("tenants").await.unwrap().is_empty());
}

async fn check_rejects_bad_field(store: &dyn DocumentStore) {
    let err = store
        .query(&entries("kim"), &Query::all().order_by(OrderBy::desc("a b")))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidField { .. }));
}

// ===========================================================================
// MemoryDocumentStore
// ===========================================================================

fn memory_store() -> (MemoryDocumentStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start()));
    (MemoryDocumentStore::with_clock(clock.clone()), clock)
}

#[tokio::test]
async fn memory_create_then_get() {
    check_create_then_get(&memory_store().0).await;
}

#[tokio::test]
async fn memory_get_missing() {
    check_get_missing(&memory_store().0).await;
}

#[tokio::test]
async fn memory_ordered_query_with_offset() {
    let (store, clock) = memory_store();
    check_ordered_query_with_offset(&store, &clock).await;
}

#[tokio::test]
async fn memory_filter_gte() {
    let (store, clock) = memory_store();
    check_filter_gte(&store, &clock).await;
}

#[tokio::test]
async fn memory_merge_upsert_keeps_other_fields() {
    check_merge_upsert_keeps_other_fields(&memory_store().0).await;
}

#[tokio::test]
async fn memory_merge_upsert_creates() {
    check_merge_upsert_creates(&memory_store().0).await;
}

#[tokio::test]
async fn memory_put_replaces() {
    check_put_replaces(&memory_store().0).await;
}

#[tokio::test]
async fn memory_batch_delete() {
    check_batch_delete(&memory_store().0).await;
}

#[tokio::test]
async fn memory_array_append() {
    check_array_append(&memory_store().0).await;
}

#[tokio::test]
async fn memory_list_top_level_keys() {
    check_list_top_level_keys(&memory_store().0).await;
}

#[tokio::test]
async fn memory_rejects_bad_field() {
    check_rejects_bad_field(&memory_store().0).await;
}

#[tokio::test]
async fn memory_batch_delete_is_all_or_nothing() {
    let (store, _) = memory_store();
    let a = store
        .create(&entries("ok"), DocWrite::new().set("n", 1))
        .await
        .unwrap();
    let b = store
        .create(&entries("broken"), DocWrite::new().set("n", 1))
        .await
        .unwrap();

    store.fail_user("broken");
    let err = store.batch_delete(&[a.path.clone(), b.path]).await;
    assert!(err.is_err());

    store.heal_user("broken");
    assert!(store.get(&a.path).await.unwrap().is_some());
    assert_eq!(store.count(&entries("broken")), 1);
}

#[tokio::test]
async fn memory_reads_do_not_count_as_mutations() {
    let (store, _) = memory_store();
    store
        .create(&entries("m"), DocWrite::new().set("n", 1))
        .await
        .unwrap();
    let before = store.mutation_count();

    store.query(&entries("m"), &Query::all()).await.unwrap();
    store.list_top_level_keys("users").await.unwrap();

    assert_eq!(store.mutation_count(), before);
}

// ===========================================================================
// SurrealDocumentStore contract tests (mirrors MemoryDocumentStore tests above)
// ===========================================================================

mod surreal_store_tests {
    use super::*;

    async fn surreal_store() -> (SurrealDocumentStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let store = SurrealDocumentStore::in_memory()
            .await
            .expect("in_memory() failed")
            .with_clock(clock.clone());
        (store, clock)
    }

    #[tokio::test]
    async fn create_then_get() {
        check_create_then_get(&surreal_store().await.0).await;
    }

    #[tokio::test]
    async fn get_missing() {
        check_get_missing(&surreal_store().await.0).await;
    }

    #[tokio::test]
    async fn ordered_query_with_offset() {
        let (store, clock) = surreal_store().await;
        check_ordered_query_with_offset(&store, &clock).await;
    }

    #[tokio::test]
    async fn filter_gte() {
        let (store, clock) = surreal_store().await;
        check_filter_gte(&store, &clock).await;
    }

    #[tokio::test]
    async fn merge_upsert_keeps_other_fields() {
        check_merge_upsert_keeps_other_fields(&surreal_store().await.0).await;
    }

    #[tokio::test]
    async fn merge_upsert_creates() {
        check_merge_upsert_creates(&surreal_store().await.0).await;
    }

    #[tokio::test]
    async fn put_replaces() {
        check_put_replaces(&surreal_store().await.0).await;
    }

    #[tokio::test]
    async fn batch_delete() {
        check_batch_delete(&surreal_store().await.0).await;
    }

    #[tokio::test]
    async fn array_append() {
        check_array_append(&surreal_store().await.0).await;
    }

    #[tokio::test]
    async fn list_top_level_keys() {
        check_list_top_level_keys(&surreal_store().await.0).await;
    }

    #[tokio::test]
    async fn rejects_bad_field() {
        check_rejects_bad_field(&surreal_store().await.0).await;
    }
}
