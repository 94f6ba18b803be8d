//! In-process implementation of the `EventRepository` trait.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use ledgerline_core::error::DomainError;
use ledgerline_core::repository::{
    Committed, EventRepository, NewEvent, StoredEvent, version_delta,
};
use ledgerline_core::stream::StreamId;

type Stream = Arc<Mutex<Vec<StoredEvent>>>;

fn poisoned() -> DomainError {
    DomainError::Infrastructure("in-memory event store lock poisoned".into())
}

/// Event store that keeps every stream in memory.
///
/// Each stream sits behind its own mutex. The version check and the append
/// happen under that lock, so writers to the same stream serialize while
/// writers to different streams never contend. The outer map lock is held
/// only long enough to find or insert a stream.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    streams: Arc<RwLock<HashMap<StreamId, Stream>>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn existing_stream(&self, stream_id: &StreamId) -> Result<Option<Stream>, DomainError> {
        let streams = self.streams.read().map_err(|_| poisoned())?;
        Ok(streams.get(stream_id).cloned())
    }

    fn stream_or_insert(&self, stream_id: &StreamId) -> Result<Stream, DomainError> {
        if let Some(stream) = self.existing_stream(stream_id)? {
            return Ok(stream);
        }
        let mut streams = self.streams.write().map_err(|_| poisoned())?;
        Ok(Arc::clone(streams.entry(stream_id.clone()).or_default()))
    }
}

fn check_version(stream_id: &StreamId, expected: i64, actual: i64) -> Result<(), DomainError> {
    if actual != expected {
        warn!(expected_version = expected, actual, "concurrency conflict");
        return Err(DomainError::ConcurrencyConflict {
            stream_id: stream_id.clone(),
            expected,
            actual,
        });
    }
    Ok(())
}

#[async_trait]
impl EventRepository for InMemoryEventStore {
    #[instrument(skip(self), fields(stream_id = %stream_id))]
    async fn load_events(&self, stream_id: &StreamId) -> Result<Vec<StoredEvent>, DomainError> {
        let Some(stream) = self.existing_stream(stream_id)? else {
            return Ok(Vec::new());
        };
        let events = stream.lock().map_err(|_| poisoned())?;
        Ok(events.clone())
    }

    #[instrument(skip(self, events), fields(stream_id = %stream_id, event_count = events.len()))]
    async fn append_events(
        &self,
        stream_id: &StreamId,
        expected_version: i64,
        events: &[NewEvent],
    ) -> Result<Committed, DomainError> {
        // Unknown streams get an entry only once a non-empty batch passes
        // the version check.
        let stream = match self.existing_stream(stream_id)? {
            Some(stream) => stream,
            None if expected_version != 0 || events.is_empty() => {
                check_version(stream_id, expected_version, 0)?;
                return Ok(Committed {
                    new_version: 0,
                    events: Vec::new(),
                });
            }
            None => self.stream_or_insert(stream_id)?,
        };
        let mut stored = stream.lock().map_err(|_| poisoned())?;

        let actual = version_delta(stored.len())?;
        check_version(stream_id, expected_version, actual)?;

        let appended: Vec<StoredEvent> = (actual..)
            .zip(events)
            .map(|(position, event)| event.clone().into_stored(stream_id.clone(), position))
            .collect();
        stored.extend(appended.iter().cloned());
        let new_version = version_delta(stored.len())?;
        drop(stored);

        debug!(new_version, "events appended");
        Ok(Committed {
            new_version,
            events: appended,
        })
    }
}
