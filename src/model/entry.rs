//! Participant submissions and their change notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::SessionId;

/// Opaque entry identifier assigned by the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
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

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Moderation state of a Q&A entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Pending,
    Answered,
}

/// One participant submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    pub session_id: SessionId,
    pub text: String,
    pub submitted_at: DateTime<Utc>,
    /// Vote count; only ever incremented
    pub upvotes: u64,
    pub status: EntryStatus,
    pub answer_text: Option<String>,
    pub answered_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// Create a fresh, unanswered entry with no votes
    pub fn new(
        id: EntryId,
        session_id: SessionId,
        text: impl Into<String>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            session_id,
            text: text.into(),
            submitted_at,
            upvotes: 0,
            status: EntryStatus::Pending,
            answer_text: None,
            answered_at: None,
        }
    }

    /// Whether the presenter has attached an answer
    pub fn is_answered(&self) -> bool {
        self.answer_text.is_some()
    }
}

/// Kind of change carried in a store notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// A new entry was appended
    Inserted,
    /// An existing entry's votes or answer changed
    Modified,
}

/// A single change in a store change batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryChange {
    pub kind: ChangeKind,
    pub entry: Entry,
}

impl EntryChange {
    pub fn inserted(entry: Entry) -> Self {
        Self {
            kind: ChangeKind::Inserted,
            entry,
        }
    }

    pub fn modified(entry: Entry) -> Self {
        Self {
            kind: ChangeKind::Modified,
            entry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_defaults() {
        let entry = Entry::new(
            EntryId::new("e1"),
            SessionId::new("s1"),
            "hello",
            Utc::now(),
        );
        assert_eq!(entry.upvotes, 0);
        assert_eq!(entry.status, EntryStatus::Pending);
        assert!(!entry.is_answered());
    }

    #[test]
    fn test_entry_wire_format() {
        let entry = Entry::new(
            EntryId::new("e1"),
            SessionId::new("s1"),
            "hello",
            Utc::now(),
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["status"], "pending");
        assert!(json["answerText"].is_null());
    }
}
