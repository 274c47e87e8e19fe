//! Contract tests for MemoryService, the authenticated operation surface.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use recall_core::*;
use recall_state::fakes::{ManualClock, MemoryDocumentStore};
use recall_state::{CollectionPath, DocWrite, DocumentStore};
use serde_json::json;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
}

struct Harness {
    store: Arc<MemoryDocumentStore>,
    clock: Arc<ManualClock>,
    service: MemoryService,
}

fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new(start()));
    let store = Arc::new(MemoryDocumentStore::with_clock(clock.clone()));
    let service = MemoryService::new(store.clone());
    Harness {
        store,
        clock,
        service,
    }
}

fn ctx(id: &str) -> CallContext {
    CallContext::authenticated(UserId::parse(id).unwrap())
}

fn store_req(message: &str, response: &str, facts: &[&str]) -> StoreMemoryRequest {
    StoreMemoryRequest {
        message: message.into(),
        response: response.into(),
        key_facts: Some(facts.iter().map(|f| f.to_string()).collect()),
    }
}

// ===========================================================================
// Authentication
// ===========================================================================

#[tokio::test]
async fn test_every_operation_requires_identity() {
    let h = harness();
    let anon = CallContext::anonymous();
    let svc = &h.service;

    let errors = vec![
        svc.store_memory(&anon, store_req("hi", "hello", &[])).await.unwrap_err(),
        svc.get_recent_memories(
            &anon,
            RecentMemoriesRequest {
                current_message: "hi".into(),
                limit: None,
            },
        )
        .await
        .unwrap_err(),
        svc.set_key_fact(
            &anon,
            SetKeyFactRequest {
                fact_type: "city".into(),
                fact_value: json!("Paris"),
            },
        )
        .await
        .unwrap_err(),
        svc.get_key_fact(&anon, "city").await.unwrap_err(),
        svc.get_all_key_facts(&anon).await.unwrap_err(),
        svc.add_preferences(
            &anon,
            AddPreferencesRequest {
                preferences: json!({"tone": "casual"}),
            },
        )
        .await
        .unwrap_err(),
        svc.get_preference_history(&anon).await.unwrap_err(),
        svc.get_summary(&anon, SummaryRequest::default()).await.unwrap_err(),
        svc.get_analytics(&anon).await.unwrap_err(),
    ];

    for err in errors {
        assert_eq!(err.kind(), ErrorKind::Unauthenticated, "{err}");
    }
    assert_eq!(h.store.mutation_count(), 0);
}

// ===========================================================================
// Validation
// ===========================================================================

#[tokio::test]
async fn test_invalid_inputs_are_rejected_without_writes() {
    let h = harness();
    let alice = ctx("alice");
    let svc = &h.service;

    let err = svc
        .store_memory(&alice, store_req("", "hello", &[]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = svc
        .get_recent_memories(&alice, RecentMemoriesRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    for value in [json!(null), json!("")] {
        let err = svc
            .set_key_fact(
                &alice,
                SetKeyFactRequest {
                    fact_type: "city".into(),
                    fact_value: value,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    let err = svc
        .add_preferences(
            &alice,
            AddPreferencesRequest {
                preferences: json!("not an object"),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    assert_eq!(h.store.mutation_count(), 0);
}

// ===========================================================================
// Memories
// ===========================================================================

#[tokio::test]
async fn test_store_then_recent() {
    let h = harness();
    let alice = ctx("alice");

    let first = h
        .service
        .store_memory(&alice, store_req("hi", "hello", &["greeting"]))
        .await
        .unwrap();
    h.clock.advance(Duration::seconds(1));
    let second = h
        .service
        .store_memory(
            &alice,
            StoreMemoryRequest {
                message: "bye".into(),
                response: "see you".into(),
                key_facts: None,
            },
        )
        .await
        .unwrap();
    assert!(first.success);
    assert_ne!(first.memory_id, second.memory_id);

    let recent = h
        .service
        .get_recent_memories(
            &alice,
            RecentMemoriesRequest {
                current_message: "anything".into(),
                limit: None,
            },
        )
        .await
        .unwrap();
    let ids: Vec<&str> = recent.memories.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec![second.memory_id.as_str(), first.memory_id.as_str()]);
    assert!(recent.memories[0].key_facts.is_empty());
    assert_eq!(recent.memories[1].key_facts, vec!["greeting".to_string()]);

    // Other users see nothing.
    let bob = h
        .service
        .get_recent_memories(
            &ctx("bob"),
            RecentMemoriesRequest {
                current_message: "x".into(),
                limit: Some(5),
            },
        )
        .await
        .unwrap();
    assert!(bob.memories.is_empty());
}

#[tokio::test]
async fn test_store_failure_is_concealed() {
    let h = harness();
    h.store.fail_user("alice");

    let err = h
        .service
        .store_memory(&ctx("alice"), store_req("hi", "hello", &[]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(matches!(&err, RecallError::Internal(msg) if msg == "Failed to store memory"));
    assert!(!err.to_string().contains("injected fault"));
}

// ===========================================================================
// Key facts
// ===========================================================================

#[tokio::test]
async fn test_key_fact_upsert_is_idempotent() {
    let h = harness();
    let alice = ctx("alice");
    let req = SetKeyFactRequest {
        fact_type: "city".into(),
        fact_value: json!("Paris"),
    };

    h.service.set_key_fact(&alice, req.clone()).await.unwrap();
    h.clock.advance(Duration::minutes(5));
    let resp = h.service.set_key_fact(&alice, req).await.unwrap();
    assert_eq!(resp.fact_type, "city");
    assert_eq!(resp.fact_value, json!("Paris"));

    let all = h.service.get_all_key_facts(&alice).await.unwrap();
    assert_eq!(all.key_facts.len(), 1);

    let fact = h.service.get_key_fact(&alice, "city").await.unwrap().unwrap();
    assert_eq!(fact.fact_type, "city");
    assert_eq!(fact.value, json!("Paris"));
    assert_eq!(fact.updated_at, Some(start() + Duration::minutes(5)));

    assert!(h.service.get_key_fact(&alice, "diet").await.unwrap().is_none());
}

#[tokio::test]
async fn test_key_fact_read_failure_is_concealed() {
    let h = harness();
    h.store.fail_user("alice");

    let err = h
        .service
        .get_key_fact(&ctx("alice"), "city")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(matches!(&err, RecallError::Internal(msg) if msg == "Failed to retrieve facts"));
    assert!(!err.to_string().contains("injected fault"));
}

#[tokio::test]
async fn test_key_fact_upsert_preserves_other_fields() {
    let h = harness();
    let alice = ctx("alice");
    let fact_doc = CollectionPath::parse("users/alice/key_facts")
        .unwrap()
        .doc("diet")
        .unwrap();
    h.store
        .put(
            &fact_doc,
            DocWrite::new()
                .set("value", "omnivore")
                .set("source", "onboarding"),
        )
        .await
        .unwrap();

    h.service
        .set_key_fact(
            &alice,
            SetKeyFactRequest {
                fact_type: "diet".into(),
                fact_value: json!("vegan"),
            },
        )
        .await
        .unwrap();
    h.service
        .set_key_fact(
            &alice,
            SetKeyFactRequest {
                fact_type: "city".into(),
                fact_value: json!("Oslo"),
            },
        )
        .await
        .unwrap();

    let doc = h.store.get(&fact_doc).await.unwrap().unwrap();
    assert_eq!(doc.get_str("value"), Some("vegan"));
    assert_eq!(doc.get_str("source"), Some("onboarding"));
    assert_eq!(doc.get_str("factType"), Some("diet"));

    let all = h.service.get_all_key_facts(&alice).await.unwrap();
    assert_eq!(all.key_facts["diet"], json!("vegan"));
    assert_eq!(all.key_facts["city"], json!("Oslo"));
}

// ===========================================================================
// Preferences
// ===========================================================================

#[tokio::test]
async fn test_preferences_append_only() {
    let h = harness();
    let alice = ctx("alice");

    for tone in ["casual", "formal", "casual"] {
        let resp = h
            .service
            .add_preferences(
                &alice,
                AddPreferencesRequest {
                    preferences: json!({ "tone": tone }),
                },
            )
            .await
            .unwrap();
        assert!(resp.success);
        h.clock.advance(Duration::seconds(30));
    }

    let history = h.service.get_preference_history(&alice).await.unwrap();
    let tones: Vec<&str> = history
        .preferences
        .iter()
        .map(|p| p.preferences["tone"].as_str().unwrap())
        .collect();
    assert_eq!(tones, vec!["casual", "formal", "casual"]);
    assert_eq!(history.preferences[0].learned_at, Some(start()));
}

// ===========================================================================
// Summary and analytics
// ===========================================================================

#[tokio::test]
async fn test_summary_window() {
    let h = harness();
    let alice = ctx("alice");

    for (days_ago, topic) in [(10, "x"), (5, "y"), (1, "x")] {
        h.clock.set(start() - Duration::days(days_ago));
        h.service
            .store_memory(&alice, store_req("q", "a", &[topic]))
            .await
            .unwrap();
    }
    h.clock.set(start());

    let summary = h
        .service
        .get_summary(&alice, SummaryRequest { days: Some(7) })
        .await
        .unwrap()
        .summary;
    assert_eq!(summary.total_conversations, 2);
    let mut topics = summary.topics_mentioned.clone();
    topics.sort();
    assert_eq!(topics, vec!["x".to_string(), "y".to_string()]);
    assert_eq!(summary.last_conversation, Some(start() - Duration::days(1)));
    assert!(summary.mood_trend.is_empty());

    // Default window is seven days.
    let default = h
        .service
        .get_summary(&alice, SummaryRequest::default())
        .await
        .unwrap()
        .summary;
    assert_eq!(default, summary);

    let wide = h
        .service
        .get_summary(&alice, SummaryRequest { days: Some(30) })
        .await
        .unwrap()
        .summary;
    assert_eq!(wide.total_conversations, 3);
}

#[tokio::test]
async fn test_summary_with_no_entries() {
    let h = harness();
    let summary = h
        .service
        .get_summary(&ctx("nobody"), SummaryRequest::default())
        .await
        .unwrap()
        .summary;
    assert_eq!(summary, Summary::default());
}

#[tokio::test]
async fn test_analytics_zero_case() {
    let h = harness();
    let analytics = h
        .service
        .get_analytics(&ctx("nobody"))
        .await
        .unwrap()
        .analytics;
    assert_eq!(analytics.total_memories_stored, 0);
    assert_eq!(analytics.total_key_facts, 0);
    assert_eq!(analytics.average_response_length, 0);
    assert_eq!(analytics.most_recent_update, None);
}

#[tokio::test]
async fn test_analytics_aggregates() {
    let h = harness();
    let alice = ctx("alice");

    h.service
        .store_memory(&alice, store_req("q1", "ab", &[]))
        .await
        .unwrap();
    h.clock.advance(Duration::hours(1));
    h.service
        .store_memory(&alice, store_req("q2", "abc", &[]))
        .await
        .unwrap();
    h.service
        .set_key_fact(
            &alice,
            SetKeyFactRequest {
                fact_type: "city".into(),
                fact_value: json!("Rome"),
            },
        )
        .await
        .unwrap();

    // An entry written without a timestamp still counts.
    h.store
        .create(
            &CollectionPath::parse("users/alice/memory_entries").unwrap(),
            DocWrite::new().set("userMessage", "legacy").set("aiResponse", "abcd"),
        )
        .await
        .unwrap();

    let analytics = h.service.get_analytics(&alice).await.unwrap().analytics;
    assert_eq!(analytics.total_memories_stored, 3);
    assert_eq!(analytics.total_key_facts, 1);
    assert_eq!(analytics.average_response_length, 3);
    assert_eq!(analytics.most_recent_update, Some(start() + Duration::hours(1)));
}
