//! `PostgreSQL` implementation of the `EventRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use ledgerline_core::error::DomainError;
use ledgerline_core::repository::{
    Committed, EventRepository, NewEvent, StoredEvent, version_delta,
};
use ledgerline_core::stream::StreamId;

use crate::schema::CREATE_EVENTS_TABLE;

/// Row shape of `domain_events`.
#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    event_id: Uuid,
    stream_id: String,
    position: i64,
    event_type: String,
    schema_version: i32,
    payload: serde_json::Value,
    correlation_id: Uuid,
    causation_id: Uuid,
    occurred_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for StoredEvent {
    type Error = DomainError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let stream_id = StreamId::new(row.stream_id)
            .map_err(|e| DomainError::Infrastructure(format!("corrupt stream id: {e}")))?;
        Ok(Self {
            event_id: row.event_id,
            stream_id,
            position: row.position,
            event_type: row.event_type,
            schema_version: row.schema_version,
            payload: row.payload,
            correlation_id: row.correlation_id,
            causation_id: row.causation_id,
            occurred_at: row.occurred_at,
        })
    }
}

fn infrastructure(err: &sqlx::Error) -> DomainError {
    DomainError::Infrastructure(err.to_string())
}

/// Name Postgres gives the `UNIQUE (stream_id, position)` constraint.
const POSITION_CONSTRAINT: &str = "domain_events_stream_id_position_key";

fn is_position_collision(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db)
            if db.is_unique_violation() && db.constraint() == Some(POSITION_CONSTRAINT)
    )
}

/// PostgreSQL-backed event store.
///
/// An append runs in one transaction that first takes a transaction-scoped
/// advisory lock on the stream, so the version check and the inserts are
/// atomic with respect to other appends to the same stream. The
/// `UNIQUE (stream_id, position)` constraint backs this up: a racing insert
/// that slips through is reported as a concurrency conflict.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a new `PgEventStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the events table and its indexes if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the DDL fails.
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::raw_sql(CREATE_EVENTS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| infrastructure(&e))?;
        Ok(())
    }

    async fn current_version(
        conn: &mut PgConnection,
        stream_id: &StreamId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM domain_events WHERE stream_id = $1")
            .bind(stream_id.as_str())
            .fetch_one(conn)
            .await
    }

    async fn insert_batch(
        tx: &mut Transaction<'_, Postgres>,
        stream_id: &StreamId,
        stored: &[StoredEvent],
    ) -> Result<(), sqlx::Error> {
        for event in stored {
            sqlx::query(
                r"INSERT INTO domain_events
                    (event_id, stream_id, position, event_type, schema_version,
                     payload, correlation_id, causation_id, occurred_at)
                  VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(event.event_id)
            .bind(stream_id.as_str())
            .bind(event.position)
            .bind(&event.event_type)
            .bind(event.schema_version)
            .bind(&event.payload)
            .bind(event.correlation_id)
            .bind(event.causation_id)
            .bind(event.occurred_at)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn conflict(&self, stream_id: &StreamId, expected: i64) -> DomainError {
        let actual = match self.pool.acquire().await {
            Ok(mut conn) => Self::current_version(&mut conn, stream_id).await,
            Err(e) => Err(e),
        };
        match actual {
            Ok(actual) => {
                warn!(expected_version = expected, actual, "concurrency conflict");
                DomainError::ConcurrencyConflict {
                    stream_id: stream_id.clone(),
                    expected,
                    actual,
                }
            }
            Err(e) => infrastructure(&e),
        }
    }
}

#[async_trait]
impl EventRepository for PgEventStore {
    #[instrument(skip(self), fields(stream_id = %stream_id))]
    async fn load_events(&self, stream_id: &StreamId) -> Result<Vec<StoredEvent>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r"SELECT event_id, stream_id, position, event_type, schema_version,
                     payload, correlation_id, causation_id, occurred_at
              FROM domain_events
              WHERE stream_id = $1
              ORDER BY position ASC",
        )
        .bind(stream_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infrastructure(&e))?;

        rows.into_iter().map(StoredEvent::try_from).collect()
    }

    #[instrument(skip(self, events), fields(stream_id = %stream_id, event_count = events.len()))]
    async fn append_events(
        &self,
        stream_id: &StreamId,
        expected_version: i64,
        events: &[NewEvent],
    ) -> Result<Committed, DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| infrastructure(&e))?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(stream_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| infrastructure(&e))?;

        let actual = Self::current_version(&mut *tx, stream_id)
            .await
            .map_err(|e| infrastructure(&e))?;
        if actual != expected_version {
            warn!(expected_version, actual, "concurrency conflict");
            return Err(DomainError::ConcurrencyConflict {
                stream_id: stream_id.clone(),
                expected: expected_version,
                actual,
            });
        }

        let stored: Vec<StoredEvent> = (actual..)
            .zip(events)
            .map(|(position, event)| event.clone().into_stored(stream_id.clone(), position))
            .collect();

        if let Err(e) = Self::insert_batch(&mut tx, stream_id, &stored).await {
            drop(tx);
            if is_position_collision(&e) {
                return Err(self.conflict(stream_id, expected_version).await);
            }
            return Err(infrastructure(&e));
        }

        tx.commit().await.map_err(|e| infrastructure(&e))?;

        let new_version = expected_version + version_delta(stored.len())?;
        debug!(new_version, "events appended");
        Ok(Committed {
            new_version,
            events: stored,
        })
    }
}
