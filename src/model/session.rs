//! Session metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque session identifier assigned by the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short code participants type to find a session
///
/// Stored upper-cased; lookups are case-insensitive and ignore surrounding
/// whitespace. The engine never interprets the code beyond using it as a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinCode(String);

impl JoinCode {
    /// Normalize a code as typed by a user
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `input` refers to this code
    pub fn matches(&self, input: &str) -> bool {
        self.0 == input.trim().to_uppercase()
    }
}

impl std::fmt::Display for JoinCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of live session, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionType {
    /// Free-text submissions aggregated into term frequencies
    WordCloud,
    /// Questions ranked by votes, answerable by the presenter
    #[serde(rename = "Q_AND_A")]
    QAndA,
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionType::WordCloud => f.write_str("WORD_CLOUD"),
            SessionType::QAndA => f.write_str("Q_AND_A"),
        }
    }
}

/// A presenter's live session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    /// Question shown to participants (word cloud sessions)
    pub prompt: Option<String>,
    pub description: Option<String>,
    pub join_code: JoinCode,
    /// Listed in the public session directory
    pub is_public: bool,
    /// Accepting new submissions
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Whether this is a Q&A session
    pub fn is_qanda(&self) -> bool {
        self.session_type == SessionType::QAndA
    }
}
