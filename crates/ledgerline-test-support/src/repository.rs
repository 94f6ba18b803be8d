//! Test repositories — mock `EventRepository` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use ledgerline_core::error::DomainError;
use ledgerline_core::repository::{
    Committed, EventRepository, NewEvent, StoredEvent, version_delta,
};
use ledgerline_core::stream::StreamId;

fn commit(stream_id: &StreamId, expected_version: i64, events: &[NewEvent]) -> Committed {
    let stored: Vec<StoredEvent> = (expected_version..)
        .zip(events)
        .map(|(position, event)| event.clone().into_stored(stream_id.clone(), position))
        .collect();
    Committed {
        new_version: expected_version + version_delta(stored.len()).unwrap(),
        events: stored,
    }
}

/// An event repository that records all `append_events` calls. Returns the
/// configured events from every `load_events` call and always accepts
/// appends without checking the expected version.
#[derive(Debug)]
pub struct RecordingEventRepository {
    load_result: Vec<StoredEvent>,
    appended: Mutex<Vec<(StreamId, i64, Vec<NewEvent>)>>,
}

impl RecordingEventRepository {
    /// Create a new recording repository that will return `load_result` from
    /// every `load_events` call.
    #[must_use]
    pub fn new(load_result: Vec<StoredEvent>) -> Self {
        Self {
            load_result,
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all appends as `(stream, expected_version, events)`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<(StreamId, i64, Vec<NewEvent>)> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn load_events(&self, _stream_id: &StreamId) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.load_result.clone())
    }

    async fn append_events(
        &self,
        stream_id: &StreamId,
        expected_version: i64,
        events: &[NewEvent],
    ) -> Result<Committed, DomainError> {
        self.appended
            .lock()
            .unwrap()
            .push((stream_id.clone(), expected_version, events.to_vec()));
        Ok(commit(stream_id, expected_version, events))
    }
}

/// An event repository that always returns an empty event list and silently
/// accepts appends. Useful for testing "aggregate not found" scenarios and
/// creation commands.
#[derive(Debug)]
pub struct EmptyEventRepository;

#[async_trait]
impl EventRepository for EmptyEventRepository {
    async fn load_events(&self, _stream_id: &StreamId) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn append_events(
        &self,
        stream_id: &StreamId,
        expected_version: i64,
        events: &[NewEvent],
    ) -> Result<Committed, DomainError> {
        Ok(commit(stream_id, expected_version, events))
    }
}

/// An event repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn load_events(&self, _stream_id: &StreamId) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn append_events(
        &self,
        _stream_id: &StreamId,
        _expected_version: i64,
        _events: &[NewEvent],
    ) -> Result<Committed, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

/// An event repository that rejects the first `conflicts` appends with a
/// `ConcurrencyConflict` (reporting one more event than expected) and accepts
/// the rest. Counts loads and append attempts so retry policies can be
/// checked.
#[derive(Debug)]
pub struct ConflictingEventRepository {
    load_result: Vec<StoredEvent>,
    remaining_conflicts: Mutex<usize>,
    loads: Mutex<usize>,
    attempts: Mutex<usize>,
}

impl ConflictingEventRepository {
    /// Create a repository that serves `load_result` and conflicts
    /// `conflicts` times before accepting an append.
    #[must_use]
    pub fn new(load_result: Vec<StoredEvent>, conflicts: usize) -> Self {
        Self {
            load_result,
            remaining_conflicts: Mutex::new(conflicts),
            loads: Mutex::new(0),
            attempts: Mutex::new(0),
        }
    }

    /// Number of `load_events` calls so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn load_calls(&self) -> usize {
        *self.loads.lock().unwrap()
    }

    /// Number of `append_events` calls so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn append_attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl EventRepository for ConflictingEventRepository {
    async fn load_events(&self, _stream_id: &StreamId) -> Result<Vec<StoredEvent>, DomainError> {
        *self.loads.lock().unwrap() += 1;
        Ok(self.load_result.clone())
    }

    async fn append_events(
        &self,
        stream_id: &StreamId,
        expected_version: i64,
        events: &[NewEvent],
    ) -> Result<Committed, DomainError> {
        *self.attempts.lock().unwrap() += 1;
        let mut remaining = self.remaining_conflicts.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(DomainError::ConcurrencyConflict {
                stream_id: stream_id.clone(),
                expected: expected_version,
                actual: expected_version + 1,
            });
        }
        Ok(commit(stream_id, expected_version, events))
    }
}
