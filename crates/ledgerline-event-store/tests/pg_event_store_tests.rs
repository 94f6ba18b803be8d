//! Integration tests for `PgEventStore`.
//!
//! These need a running PostgreSQL reachable through `DATABASE_URL`; run them
//! with `cargo test -- --ignored`.

use chrono::{TimeZone, Utc};
use ledgerline_core::error::DomainError;
use ledgerline_core::repository::{EventRepository, NewEvent};
use ledgerline_core::stream::StreamId;
use ledgerline_event_store::pg_event_store::PgEventStore;
use sqlx::PgPool;
use uuid::Uuid;

/// Helper to build a `NewEvent` with sensible defaults.
fn make_new_event() -> NewEvent {
    NewEvent {
        event_id: Uuid::now_v7(),
        event_type: "TestEvent".to_string(),
        schema_version: 1,
        payload: serde_json::json!({"key": "value"}),
        correlation_id: Uuid::new_v4(),
        causation_id: Uuid::new_v4(),
        occurred_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
    }
}

fn batch(n: usize) -> Vec<NewEvent> {
    (0..n).map(|_| make_new_event()).collect()
}

fn fresh_stream() -> StreamId {
    StreamId::new(format!("acc-{}", Uuid::new_v4())).unwrap()
}

// --- load_events ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_load_events_returns_empty_vec_for_unknown_stream(pool: PgPool) {
    let store = PgEventStore::new(pool);

    let events = store.load_events(&fresh_stream()).await.unwrap();

    assert!(events.is_empty());
}

// --- append_events + load_events ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_append_and_load_preserves_envelope(pool: PgPool) {
    // Arrange
    let store = PgEventStore::new(pool);
    let stream_id = fresh_stream();
    let event = make_new_event();

    // Act
    let committed = store
        .append_events(&stream_id, 0, std::slice::from_ref(&event))
        .await
        .unwrap();

    // Assert
    assert_eq!(committed.new_version, 1);
    let loaded = store.load_events(&stream_id).await.unwrap();
    assert_eq!(loaded.len(), 1);
    let e = &loaded[0];
    assert_eq!(e.event_id, event.event_id);
    assert_eq!(e.stream_id, stream_id);
    assert_eq!(e.position, 0);
    assert_eq!(e.event_type, event.event_type);
    assert_eq!(e.schema_version, 1);
    assert_eq!(e.payload, event.payload);
    assert_eq!(e.correlation_id, event.correlation_id);
    assert_eq!(e.causation_id, event.causation_id);
    assert_eq!(e.occurred_at, event.occurred_at);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_sequential_appends_assign_consecutive_positions(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let stream_id = fresh_stream();

    store.append_events(&stream_id, 0, &batch(2)).await.unwrap();
    let committed = store.append_events(&stream_id, 2, &batch(2)).await.unwrap();

    assert_eq!(committed.new_version, 4);
    let loaded = store.load_events(&stream_id).await.unwrap();
    let positions: Vec<i64> = loaded.iter().map(|e| e.position).collect();
    assert_eq!(positions, vec![0, 1, 2, 3]);
}

// --- concurrency ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_stale_expected_version_is_rejected(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let stream_id = fresh_stream();
    store.append_events(&stream_id, 0, &batch(3)).await.unwrap();
    store.append_events(&stream_id, 3, &batch(1)).await.unwrap();

    let result = store.append_events(&stream_id, 3, &batch(1)).await;

    match result {
        Err(DomainError::ConcurrencyConflict {
            stream_id: conflict_stream,
            expected,
            actual,
        }) => {
            assert_eq!(conflict_stream, stream_id);
            assert_eq!(expected, 3);
            assert_eq!(actual, 4);
        }
        other => panic!("expected ConcurrencyConflict, got {other:?}"),
    }
    assert_eq!(store.load_events(&stream_id).await.unwrap().len(), 4);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_appends_exactly_one_wins(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let stream_id = fresh_stream();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            let stream_id = stream_id.clone();
            tokio::spawn(async move { store.append_events(&stream_id, 0, &batch(2)).await })
        })
        .collect();

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(DomainError::ConcurrencyConflict { actual, .. }) => assert_eq!(actual, 2),
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(store.load_events(&stream_id).await.unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_failed_batch_leaves_no_partial_commit(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let stream_id = fresh_stream();
    let first = make_new_event();
    store
        .append_events(&stream_id, 0, std::slice::from_ref(&first))
        .await
        .unwrap();

    // The second event reuses an existing event_id, violating the primary key.
    let mut duplicate = make_new_event();
    duplicate.event_id = first.event_id;
    let result = store
        .append_events(&stream_id, 1, &[make_new_event(), duplicate])
        .await;

    assert!(result.is_err());
    assert_eq!(store.load_events(&stream_id).await.unwrap().len(), 1);
}

// --- edge cases ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_append_empty_events_is_noop(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let stream_id = fresh_stream();

    let committed = store.append_events(&stream_id, 0, &[]).await.unwrap();

    assert_eq!(committed.new_version, 0);
    assert!(store.load_events(&stream_id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_ensure_schema_is_idempotent(pool: PgPool) {
    let store = PgEventStore::new(pool);

    store.ensure_schema().await.unwrap();
    store.ensure_schema().await.unwrap();
}
