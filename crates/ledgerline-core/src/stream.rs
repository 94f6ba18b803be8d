//! Stream identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Longest identifier accepted, matching the storage column width.
pub const MAX_STREAM_ID_LEN: usize = 255;

/// Identifies one aggregate instance and therefore one event stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StreamId(String);

impl StreamId {
    /// Creates a stream identifier from caller-supplied text.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the value is blank, has
    /// surrounding whitespace, or exceeds [`MAX_STREAM_ID_LEN`] bytes.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::Validation(
                "stream id must not be empty".into(),
            ));
        }
        if value.trim() != value {
            return Err(DomainError::Validation(format!(
                "stream id '{value}' must not have surrounding whitespace"
            )));
        }
        if value.len() > MAX_STREAM_ID_LEN {
            return Err(DomainError::Validation(format!(
                "stream id must be at most {MAX_STREAM_ID_LEN} bytes"
            )));
        }
        Ok(Self(value))
    }

    /// Generates a fresh, time-ordered identifier for a new aggregate.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StreamId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for StreamId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StreamId> for String {
    fn from(id: StreamId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_plain_identifier() {
        let id = StreamId::new("acc123").unwrap();
        assert_eq!(id.as_str(), "acc123");
        assert_eq!(id.to_string(), "acc123");
    }

    #[test]
    fn test_new_rejects_blank_identifier() {
        match StreamId::new("   ") {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("empty")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_new_rejects_surrounding_whitespace() {
        assert!(StreamId::new(" acc123").is_err());
    }

    #[test]
    fn test_new_rejects_overlong_identifier() {
        let long = "a".repeat(MAX_STREAM_ID_LEN + 1);
        assert!(StreamId::new(long).is_err());
    }

    #[test]
    fn test_generate_produces_distinct_ids() {
        assert_ne!(StreamId::generate(), StreamId::generate());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: StreamId = serde_json::from_str("\"acc123\"").unwrap();
        assert_eq!(ok.as_str(), "acc123");
        assert!(serde_json::from_str::<StreamId>("\"\"").is_err());
    }
}
