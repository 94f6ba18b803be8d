//! Domain event abstractions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, ReplayError};
use crate::stream::StreamId;

/// Metadata attached to every domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Type name for deserialization routing.
    pub event_type: String,
    /// Stream this event belongs to.
    pub stream_id: StreamId,
    /// Zero-based position within the stream. For an event that has not been
    /// committed yet, the position it will occupy if the append succeeds.
    pub position: i64,
    /// Schema version of the payload shape.
    pub schema_version: i32,
    /// Correlation ID for tracing a command through its effects.
    pub correlation_id: Uuid,
    /// Causation ID linking this event to the command that caused it.
    pub causation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

/// Trait that all domain events implement.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type name (used for serialization routing).
    fn event_type(&self) -> &'static str;

    /// Returns the schema version this event serializes as.
    fn schema_version(&self) -> i32;

    /// Serializes the event payload to JSON.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload cannot be
    /// represented as JSON.
    fn to_payload(&self) -> Result<serde_json::Value, DomainError>;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;
}

/// Rebuilds a typed event from its stored form.
///
/// Implementations must be total over the event types their aggregate kind
/// knows and must reject everything else.
pub trait EventCodec: DomainEvent + Sized {
    /// Decodes an already-upcast payload into the typed event.
    ///
    /// # Errors
    ///
    /// Returns `ReplayError` for an unknown event type or a payload that does
    /// not match the current schema.
    fn decode(metadata: EventMetadata, payload: serde_json::Value) -> Result<Self, ReplayError>;
}
