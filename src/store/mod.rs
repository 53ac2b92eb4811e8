//! Boundary with the external session registry and entry store
//!
//! The engine never owns durable state. It reads sessions, appends and
//! mutates entries, and listens to an ordered change feed per session through
//! [`FeedbackStore`]. [`MemoryStore`] is an in-process implementation used by
//! tests and the demo, and a model for backends that sit on a real database.

pub mod memory;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{Result, StoreError};
use crate::model::{Entry, EntryChange, EntryId, Session, SessionId};

pub use memory::{MemoryStore, NewSession, SessionDetails};

/// Fields a participant supplies when submitting an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub text: String,
}

impl NewEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A single atomic write against an existing entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryUpdate {
    /// Increment `upvotes` by exactly one
    Upvote,
    /// Set the answer, overwriting any earlier one
    Answer { text: String },
}

/// Identifies one open entry feed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedHandle {
    pub session_id: SessionId,
    pub id: u64,
}

/// Message delivered on an entry feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMessage {
    /// Changes in the order the store accepted the writes
    Changes(Vec<EntryChange>),
    /// The listener failed; no further messages follow
    Failed(StoreError),
    /// The session was deleted; no further messages follow
    Removed,
}

/// An open subscription to a session's entries
///
/// `initial` is the entry set at the moment the listener was registered, in
/// submission order. Every write accepted afterwards arrives on `changes`.
#[derive(Debug)]
pub struct EntryFeed {
    pub handle: FeedHandle,
    pub initial: Vec<Entry>,
    pub changes: mpsc::UnboundedReceiver<FeedMessage>,
}

/// Session registry and entry store used by the engine
#[async_trait]
pub trait FeedbackStore: Send + Sync + 'static {
    /// Resolve a session by id
    async fn get_session(&self, session_id: &SessionId) -> Result<Session>;

    /// Resolve a session by join code (case-insensitive)
    async fn find_session_by_join_code(&self, code: &str) -> Result<Session>;

    /// Append an entry, assigning its id and submission timestamp
    async fn append_entry(&self, session_id: &SessionId, entry: NewEntry) -> Result<Entry>;

    /// Apply one atomic update to an entry, returning the updated entry
    async fn update_entry(
        &self,
        session_id: &SessionId,
        entry_id: &EntryId,
        update: EntryUpdate,
    ) -> Result<Entry>;

    /// Open an ordered change feed for a session
    async fn subscribe_entries(&self, session_id: &SessionId) -> Result<EntryFeed>;

    /// Close a feed opened by `subscribe_entries`
    async fn unsubscribe_entries(&self, handle: FeedHandle);
}
