//! Aggregate root abstraction and the replay engine.

use crate::error::ReplayError;
use crate::event::{EventCodec, EventMetadata};
use crate::repository::StoredEvent;
use crate::stream::StreamId;
use crate::upcast::UpcasterChain;

/// Trait for aggregate roots that reconstitute from event history.
///
/// `Default` is the zero value replay starts from: version 0, no identity.
pub trait AggregateRoot: Default + Send + Sync {
    /// The event type this aggregate produces and consumes.
    type Event: EventCodec;

    /// Aggregate kind name, used in logs.
    const KIND: &'static str;

    /// Returns the aggregate identifier, once the first event has set it.
    fn aggregate_id(&self) -> Option<&StreamId>;

    /// Returns the current version (number of events applied).
    fn version(&self) -> i64;

    /// Applies one event, advancing state and incrementing the version.
    ///
    /// # Errors
    ///
    /// Returns `ReplayError` if the event cannot occur in the current state.
    /// The aggregate must not be used after an error.
    fn apply(&mut self, event: &Self::Event) -> Result<(), ReplayError>;
}

/// Folds typed events into a fresh aggregate.
///
/// # Errors
///
/// Returns the first `ReplayError` raised by `apply`.
pub fn replay<'a, A, I>(events: I) -> Result<A, ReplayError>
where
    A: AggregateRoot,
    A::Event: 'a,
    I: IntoIterator<Item = &'a A::Event>,
{
    events.into_iter().try_fold(A::default(), |mut aggregate, event| {
        aggregate.apply(event)?;
        Ok(aggregate)
    })
}

/// Decodes stored events and folds them into a fresh aggregate.
///
/// Each event must belong to `stream_id` and sit at the position equal to
/// its index; payloads are upcast to the current schema before decoding.
///
/// # Errors
///
/// Returns `ReplayError` for a foreign event, a position gap, a failed
/// upcast, an undecodable payload, or an event `apply` rejects.
pub fn reconstitute<A: AggregateRoot>(
    stream_id: &StreamId,
    stored_events: &[StoredEvent],
    upcasters: &UpcasterChain,
) -> Result<A, ReplayError> {
    let mut aggregate = A::default();
    for (expected_position, stored) in (0_i64..).zip(stored_events) {
        if &stored.stream_id != stream_id {
            return Err(ReplayError::new(
                stream_id.clone(),
                stored.position,
                format!("event {} belongs to stream {}", stored.event_id, stored.stream_id),
            ));
        }
        if stored.position != expected_position {
            return Err(ReplayError::new(
                stream_id.clone(),
                stored.position,
                format!("expected position {expected_position}"),
            ));
        }

        let payload = upcasters.upcast(stored)?;
        let metadata = EventMetadata {
            event_id: stored.event_id,
            event_type: stored.event_type.clone(),
            stream_id: stored.stream_id.clone(),
            position: stored.position,
            schema_version: upcasters.current_version(&stored.event_type),
            correlation_id: stored.correlation_id,
            causation_id: stored.causation_id,
            occurred_at: stored.occurred_at,
        };
        let event = A::Event::decode(metadata, payload)?;
        aggregate.apply(&event)?;
    }

    tracing::trace!(
        kind = A::KIND,
        stream_id = %stream_id,
        version = aggregate.version(),
        "aggregate reconstituted"
    );
    Ok(aggregate)
}
