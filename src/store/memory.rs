//! In-process session registry and entry store
//!
//! All state sits behind one `RwLock`, so every write and its change
//! notification happen atomically: listeners observe writes in exactly the
//! order they were accepted, and a newly opened feed sees either the state
//! before a write (plus the change) or after it, never both.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::{mpsc, RwLock};

use super::{EntryFeed, EntryUpdate, FeedHandle, FeedMessage, FeedbackStore, NewEntry};
use crate::error::{Error, Missing, Result, StoreError};
use crate::model::{
    Entry, EntryChange, EntryId, EntryStatus, JoinCode, Session, SessionId, SessionType,
};

/// Fields a presenter supplies when creating a session
#[derive(Debug, Clone)]
pub struct NewSession {
    pub title: String,
    pub session_type: SessionType,
    pub prompt: Option<String>,
    pub description: Option<String>,
    /// Generated by the caller; stored upper-cased
    pub join_code: String,
    pub is_public: bool,
}

impl NewSession {
    /// A private session with no prompt or description
    pub fn new(title: impl Into<String>, session_type: SessionType, join_code: &str) -> Self {
        Self {
            title: title.into(),
            session_type,
            prompt: None,
            description: None,
            join_code: join_code.to_string(),
            is_public: false,
        }
    }

    /// Set the prompt shown to word cloud participants
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// List the session in the public directory
    pub fn public(mut self) -> Self {
        self.is_public = true;
        self
    }
}

/// Presenter-editable session fields
///
/// The session type is fixed at creation and has no field here.
#[derive(Debug, Clone, Default)]
pub struct SessionDetails {
    pub title: String,
    pub description: Option<String>,
    /// Ignored for Q&A sessions
    pub prompt: Option<String>,
}

struct SessionSlot {
    session: Session,
    entries: IndexMap<EntryId, Entry>,
    feeds: Vec<(u64, mpsc::UnboundedSender<FeedMessage>)>,
}

impl SessionSlot {
    /// Deliver a message to every open feed, dropping feeds whose receiver is gone
    fn notify(&mut self, message: FeedMessage) {
        self.feeds.retain(|(_, tx)| tx.send(message.clone()).is_ok());
    }
}

/// Reference `FeedbackStore` keeping everything in memory
pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionId, SessionSlot>>,
    next_feed_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_feed_id: AtomicU64::new(1),
        }
    }

    /// Create a new, active session
    ///
    /// Fails with `Validation` if the title is blank or the join code is
    /// already used by an active session.
    pub async fn create_session(&self, new: NewSession) -> Result<Session> {
        if new.title.trim().is_empty() {
            return Err(Error::validation("session title is empty"));
        }
        let join_code = JoinCode::new(&new.join_code);
        if join_code.as_str().is_empty() {
            return Err(Error::validation("join code is empty"));
        }

        let mut sessions = self.sessions.write().await;

        let in_use = sessions
            .values()
            .any(|slot| slot.session.is_active && slot.session.join_code == join_code);
        if in_use {
            return Err(Error::validation(format!(
                "join code {} is already in use",
                join_code
            )));
        }

        let session = Session {
            id: SessionId::generate(),
            title: new.title,
            session_type: new.session_type,
            prompt: new.prompt,
            description: new.description,
            join_code,
            is_public: new.is_public,
            is_active: true,
            created_at: Utc::now(),
        };

        sessions.insert(
            session.id.clone(),
            SessionSlot {
                session: session.clone(),
                entries: IndexMap::new(),
                feeds: Vec::new(),
            },
        );

        tracing::info!(
            session = %session.id,
            code = %session.join_code,
            kind = %session.session_type,
            "Session created"
        );

        Ok(session)
    }

    /// Edit title, description, and (word cloud only) prompt
    pub async fn update_session_details(
        &self,
        session_id: &SessionId,
        details: SessionDetails,
    ) -> Result<Session> {
        if details.title.trim().is_empty() {
            return Err(Error::validation("session title is empty"));
        }

        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(session_id)
            .ok_or_else(|| Missing::Session(session_id.clone()))?;

        slot.session.title = details.title;
        slot.session.description = details.description;
        if slot.session.session_type == SessionType::WordCloud {
            slot.session.prompt = details.prompt;
        }

        Ok(slot.session.clone())
    }

    /// Open or close a session for new submissions
    pub async fn set_active(&self, session_id: &SessionId, active: bool) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(session_id)
            .ok_or_else(|| Missing::Session(session_id.clone()))?;

        slot.session.is_active = active;
        tracing::info!(session = %session_id, active, "Session activity changed");

        Ok(slot.session.clone())
    }

    /// Delete a session together with all of its entries
    ///
    /// Open feeds receive `FeedMessage::Removed` and are closed.
    pub async fn delete_session(&self, session_id: &SessionId) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let mut slot = sessions
            .remove(session_id)
            .ok_or_else(|| Missing::Session(session_id.clone()))?;

        slot.notify(FeedMessage::Removed);

        tracing::info!(
            session = %session_id,
            entries = slot.entries.len(),
            "Session deleted"
        );

        Ok(())
    }

    /// Public, active sessions, newest first
    pub async fn public_sessions(&self) -> Vec<Session> {
        let sessions = self.sessions.read().await;
        let mut public: Vec<Session> = sessions
            .values()
            .filter(|slot| slot.session.is_public && slot.session.is_active)
            .map(|slot| slot.session.clone())
            .collect();
        public.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        public
    }

    /// Current entries of a session in submission order
    pub async fn entries(&self, session_id: &SessionId) -> Result<Vec<Entry>> {
        let sessions = self.sessions.read().await;
        let slot = sessions
            .get(session_id)
            .ok_or_else(|| Missing::Session(session_id.clone()))?;
        Ok(slot.entries.values().cloned().collect())
    }

    /// Terminate every open feed of a session with a listener failure
    pub async fn interrupt_feeds(&self, session_id: &SessionId, reason: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(slot) = sessions.get_mut(session_id) {
            let feeds = std::mem::take(&mut slot.feeds);
            tracing::warn!(
                session = %session_id,
                feeds = feeds.len(),
                reason,
                "Entry feeds interrupted"
            );
            for (_, tx) in feeds {
                let _ = tx.send(FeedMessage::Failed(StoreError::new(reason)));
            }
        }
    }

    /// Number of open feeds for a session
    pub async fn feed_count(&self, session_id: &SessionId) -> usize {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).map_or(0, |slot| slot.feeds.len())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    async fn get_session(&self, session_id: &SessionId) -> Result<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|slot| slot.session.clone())
            .ok_or_else(|| Missing::Session(session_id.clone()).into())
    }

    async fn find_session_by_join_code(&self, code: &str) -> Result<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .map(|slot| &slot.session)
            .filter(|session| session.join_code.matches(code))
            // Prefer an active session if a code was reused after deactivation
            .max_by_key(|session| (session.is_active, session.created_at))
            .cloned()
            .ok_or_else(|| Missing::JoinCode(code.to_string()).into())
    }

    async fn append_entry(&self, session_id: &SessionId, entry: NewEntry) -> Result<Entry> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(session_id)
            .ok_or_else(|| Missing::Session(session_id.clone()))?;

        let entry = Entry::new(EntryId::generate(), session_id.clone(), entry.text, Utc::now());
        slot.entries.insert(entry.id.clone(), entry.clone());
        slot.notify(FeedMessage::Changes(vec![EntryChange::inserted(entry.clone())]));

        Ok(entry)
    }

    async fn update_entry(
        &self,
        session_id: &SessionId,
        entry_id: &EntryId,
        update: EntryUpdate,
    ) -> Result<Entry> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(session_id)
            .ok_or_else(|| Missing::Session(session_id.clone()))?;
        let entry = slot
            .entries
            .get_mut(entry_id)
            .ok_or_else(|| Missing::Entry(entry_id.clone()))?;

        match update {
            EntryUpdate::Upvote => {
                entry.upvotes = entry.upvotes.saturating_add(1);
            }
            EntryUpdate::Answer { text } => {
                entry.answer_text = Some(text);
                entry.answered_at = Some(Utc::now());
                entry.status = EntryStatus::Answered;
            }
        }

        let entry = entry.clone();
        slot.notify(FeedMessage::Changes(vec![EntryChange::modified(entry.clone())]));

        Ok(entry)
    }

    async fn subscribe_entries(&self, session_id: &SessionId) -> Result<EntryFeed> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(session_id)
            .ok_or_else(|| Missing::Session(session_id.clone()))?;

        let id = self.next_feed_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        slot.feeds.push((id, tx));

        tracing::debug!(
            session = %session_id,
            feed = id,
            entries = slot.entries.len(),
            "Entry feed opened"
        );

        Ok(EntryFeed {
            handle: FeedHandle {
                session_id: session_id.clone(),
                id,
            },
            initial: slot.entries.values().cloned().collect(),
            changes: rx,
        })
    }

    async fn unsubscribe_entries(&self, handle: FeedHandle) {
        let mut sessions = self.sessions.write().await;
        if let Some(slot) = sessions.get_mut(&handle.session_id) {
            slot.feeds.retain(|(id, _)| *id != handle.id);
            tracing::debug!(session = %handle.session_id, feed = handle.id, "Entry feed closed");
        }
    }
}
