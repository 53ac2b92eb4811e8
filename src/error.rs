//! Error types
//!
//! Every mutating operation and every lookup surfaces one of three failures:
//! bad input, an unresolvable id, or a failure reported by the backing store.

use serde::{Deserialize, Serialize};

use crate::model::{EntryId, SessionId};

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Input was rejected before reaching the store
    #[error("validation failed: {0}")]
    Validation(String),

    /// A session, join code, or entry could not be resolved
    #[error("{0} not found")]
    NotFound(Missing),

    /// The persistence layer failed to read or write
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Error::Validation(reason.into())
    }

    /// Whether this error came from input validation
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Whether this error is a failed lookup
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// What a `NotFound` error failed to resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    /// Session id
    Session(SessionId),
    /// Join code, as supplied by the caller
    JoinCode(String),
    /// Entry id
    Entry(EntryId),
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Missing::Session(id) => write!(f, "session {}", id),
            Missing::JoinCode(code) => write!(f, "join code {:?}", code),
            Missing::Entry(id) => write!(f, "entry {}", id),
        }
    }
}

impl From<Missing> for Error {
    fn from(missing: Missing) -> Self {
        Error::NotFound(missing)
    }
}

/// Failure reported by the backing store (network, unavailability, listener loss)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("store error: {message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    /// Create a store error with a human-readable reason
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The reason reported by the store
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::validation("text is empty");
        assert_eq!(err.to_string(), "validation failed: text is empty");

        let err: Error = Missing::JoinCode("abc12".into()).into();
        assert_eq!(err.to_string(), "join code \"abc12\" not found");
        assert!(err.is_not_found());

        let err: Error = StoreError::new("unavailable").into();
        assert_eq!(err.to_string(), "store error: unavailable");
        assert!(!err.is_validation());
    }
}
