//! Event repository abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::stream::StreamId;

/// An event ready to be appended; the store assigns its position.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Schema version of `payload`.
    pub schema_version: i32,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Causation ID linking to the causing command.
    pub causation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

impl NewEvent {
    /// Serializes a domain event into its storable form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if payload serialization fails.
    pub fn from_domain_event<E: DomainEvent>(event: &E) -> Result<Self, DomainError> {
        let meta = event.metadata();
        Ok(Self {
            event_id: meta.event_id,
            event_type: event.event_type().to_owned(),
            schema_version: event.schema_version(),
            payload: event.to_payload()?,
            correlation_id: meta.correlation_id,
            causation_id: meta.causation_id,
            occurred_at: meta.occurred_at,
        })
    }

    /// Binds this event to a stream position.
    #[must_use]
    pub fn into_stored(self, stream_id: StreamId, position: i64) -> StoredEvent {
        StoredEvent {
            event_id: self.event_id,
            stream_id,
            position,
            event_type: self.event_type,
            schema_version: self.schema_version,
            payload: self.payload,
            correlation_id: self.correlation_id,
            causation_id: self.causation_id,
            occurred_at: self.occurred_at,
        }
    }
}

/// Persisted event envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Stream this event belongs to.
    pub stream_id: StreamId,
    /// Zero-based position within the stream.
    pub position: i64,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Schema version of `payload`, consumed by upcasters.
    pub schema_version: i32,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Causation ID linking to the causing command.
    pub causation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

/// Result of a successful append.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed {
    /// Stream version after the append.
    pub new_version: i64,
    /// The appended events with their assigned positions.
    pub events: Vec<StoredEvent>,
}

/// Converts a batch length to a version delta.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the length does not fit in `i64`.
pub fn version_delta(len: usize) -> Result<i64, DomainError> {
    i64::try_from(len)
        .map_err(|_| DomainError::Infrastructure(format!("batch of {len} events is too large")))
}

/// Repository trait for loading and appending domain events.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Loads all events of a stream ordered by position. An unknown stream
    /// yields an empty vector.
    async fn load_events(&self, stream_id: &StreamId) -> Result<Vec<StoredEvent>, DomainError>;

    /// Appends `events` at consecutive positions if and only if the stream
    /// currently holds exactly `expected_version` events. Either the whole
    /// batch is persisted or nothing is.
    ///
    /// An empty batch performs the version check and leaves the stream as is.
    async fn append_events(
        &self,
        stream_id: &StreamId,
        expected_version: i64,
        events: &[NewEvent],
    ) -> Result<Committed, DomainError>;
}
