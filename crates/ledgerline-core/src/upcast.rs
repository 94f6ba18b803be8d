//! Payload upcasting.
//!
//! Stored payloads are never rewritten. When the shape of an event type
//! changes, its schema version is bumped and a step is registered that turns
//! the previous shape into the next one. Replay runs every step between the
//! stored version and the current one before decoding.

use std::collections::HashMap;

use crate::error::ReplayError;
use crate::repository::StoredEvent;

/// Transforms a payload from one schema version to the next.
pub type UpcastFn = fn(serde_json::Value) -> Result<serde_json::Value, String>;

/// Registry of upcast steps keyed by event type and source version.
#[derive(Debug, Clone, Default)]
pub struct UpcasterChain {
    current: HashMap<&'static str, i32>,
    steps: HashMap<(&'static str, i32), UpcastFn>,
}

impl UpcasterChain {
    /// Creates an empty chain. Every event type is at version 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the current schema version of an event type.
    #[must_use]
    pub fn with_current_version(mut self, event_type: &'static str, version: i32) -> Self {
        self.current.insert(event_type, version);
        self
    }

    /// Registers the step from `from_version` to `from_version + 1`.
    #[must_use]
    pub fn with_step(
        mut self,
        event_type: &'static str,
        from_version: i32,
        step: UpcastFn,
    ) -> Self {
        self.steps.insert((event_type, from_version), step);
        self
    }

    /// Returns the current schema version of an event type.
    #[must_use]
    pub fn current_version(&self, event_type: &str) -> i32 {
        self.current.get(event_type).copied().unwrap_or(1)
    }

    /// Brings a stored payload up to the current schema version.
    ///
    /// # Errors
    ///
    /// Returns `ReplayError` if the stored version is newer than the current
    /// one, if a step is missing, or if a step rejects the payload.
    pub fn upcast(&self, stored: &StoredEvent) -> Result<serde_json::Value, ReplayError> {
        let fail =
            |reason: String| ReplayError::new(stored.stream_id.clone(), stored.position, reason);
        let target = self.current_version(&stored.event_type);

        if stored.schema_version > target {
            return Err(fail(format!(
                "'{}' schema version {} is newer than supported version {target}",
                stored.event_type, stored.schema_version
            )));
        }
        if stored.schema_version < 1 {
            return Err(fail(format!(
                "'{}' has invalid schema version {}",
                stored.event_type, stored.schema_version
            )));
        }

        let mut payload = stored.payload.clone();
        for version in stored.schema_version..target {
            let step = self
                .steps
                .get(&(stored.event_type.as_str(), version))
                .ok_or_else(|| {
                    fail(format!(
                        "no upcaster for '{}' from schema version {version}",
                        stored.event_type
                    ))
                })?;
            payload = step(payload).map_err(|e| {
                fail(format!(
                    "upcasting '{}' from schema version {version} failed: {e}",
                    stored.event_type
                ))
            })?;
        }
        Ok(payload)
    }
}
