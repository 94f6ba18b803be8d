//! Domain error types.

use thiserror::Error;

use crate::stream::StreamId;

/// A stored event that cannot be folded into its aggregate.
///
/// Indicates corrupted history or a schema-versioning bug. Processing of the
/// stream must stop; retrying cannot help.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("replay failed on stream {stream_id} at position {position}: {reason}")]
pub struct ReplayError {
    /// The stream being replayed.
    pub stream_id: StreamId,
    /// Position of the offending event.
    pub position: i64,
    /// What was wrong with it.
    pub reason: String,
}

impl ReplayError {
    /// Creates a new `ReplayError`.
    #[must_use]
    pub fn new(stream_id: StreamId, position: i64, reason: impl Into<String>) -> Self {
        Self {
            stream_id,
            position,
            reason: reason.into(),
        }
    }
}

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No events exist for the requested stream.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(StreamId),

    /// The stream moved on since the caller read it.
    #[error(
        "concurrency conflict on stream {stream_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        /// The stream that had the conflict.
        stream_id: StreamId,
        /// The version the writer observed when it read the stream.
        expected: i64,
        /// The version the store actually holds.
        actual: i64,
    },

    /// A business rule rejected the command. No event was produced.
    #[error("validation error: {0}")]
    Validation(String),

    /// Stored history could not be replayed.
    #[error(transparent)]
    Replay(#[from] ReplayError),

    /// The durability layer failed. The outcome of an interrupted append is
    /// unknown; callers must re-read the stream before retrying.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Returns `true` for errors a caller may resolve by re-reading the
    /// stream and re-running the command.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}
