#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use live_feedback::aggregate::Aggregate;
use live_feedback::live::{FeedHandler, LiveEvent, Subscription};
use live_feedback::model::{Entry, EntryId, Session, SessionId, SessionType};
use live_feedback::store::{
    EntryFeed, EntryUpdate, FeedHandle, FeedbackStore, MemoryStore, NewEntry, NewSession,
};
use live_feedback::ticker::TickerItem;
use live_feedback::{Result, StoreError};

/// MemoryStore wrapper whose writes can be made to fail
pub struct FaultyStore {
    pub inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::new("backend unavailable").into());
        }
        Ok(())
    }
}

#[async_trait]
impl FeedbackStore for FaultyStore {
    async fn get_session(&self, session_id: &SessionId) -> Result<Session> {
        self.inner.get_session(session_id).await
    }

    async fn find_session_by_join_code(&self, code: &str) -> Result<Session> {
        self.inner.find_session_by_join_code(code).await
    }

    async fn append_entry(&self, session_id: &SessionId, entry: NewEntry) -> Result<Entry> {
        self.check()?;
        self.inner.append_entry(session_id, entry).await
    }

    async fn update_entry(
        &self,
        session_id: &SessionId,
        entry_id: &EntryId,
        update: EntryUpdate,
    ) -> Result<Entry> {
        self.check()?;
        self.inner.update_entry(session_id, entry_id, update).await
    }

    async fn subscribe_entries(&self, session_id: &SessionId) -> Result<EntryFeed> {
        self.inner.subscribe_entries(session_id).await
    }

    async fn unsubscribe_entries(&self, handle: FeedHandle) {
        self.inner.unsubscribe_entries(handle).await
    }
}

/// MemoryStore wrapper that holds `subscribe_entries` for chosen sessions
/// until released
pub struct GatedStore {
    pub inner: MemoryStore,
    gated: Mutex<HashSet<SessionId>>,
    release: Notify,
}

impl GatedStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            gated: Mutex::new(HashSet::new()),
            release: Notify::new(),
        }
    }

    pub fn gate(&self, session_id: &SessionId) {
        self.gated.lock().unwrap().insert(session_id.clone());
    }

    /// Let one held `subscribe_entries` call through
    pub fn release_one(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl FeedbackStore for GatedStore {
    async fn get_session(&self, session_id: &SessionId) -> Result<Session> {
        self.inner.get_session(session_id).await
    }

    async fn find_session_by_join_code(&self, code: &str) -> Result<Session> {
        self.inner.find_session_by_join_code(code).await
    }

    async fn append_entry(&self, session_id: &SessionId, entry: NewEntry) -> Result<Entry> {
        self.inner.append_entry(session_id, entry).await
    }

    async fn update_entry(
        &self,
        session_id: &SessionId,
        entry_id: &EntryId,
        update: EntryUpdate,
    ) -> Result<Entry> {
        self.inner.update_entry(session_id, entry_id, update).await
    }

    async fn subscribe_entries(&self, session_id: &SessionId) -> Result<EntryFeed> {
        let held = self.gated.lock().unwrap().contains(session_id);
        if held {
            self.release.notified().await;
        }
        self.inner.subscribe_entries(session_id).await
    }

    async fn unsubscribe_entries(&self, handle: FeedHandle) {
        self.inner.unsubscribe_entries(handle).await
    }
}

pub async fn create(store: &MemoryStore, kind: SessionType, code: &str) -> Session {
    store
        .create_session(NewSession::new("Session", kind, code))
        .await
        .unwrap()
}

/// Skip ticker events until the next aggregate
pub async fn next_aggregate(subscription: &mut Subscription) -> Aggregate {
    loop {
        match subscription.recv().await {
            Some(LiveEvent::Aggregate(aggregate)) => return aggregate,
            Some(LiveEvent::Ticker(_)) => continue,
            other => panic!("expected aggregate, got {:?}", other),
        }
    }
}

/// Skip aggregate events until the next ticker update
pub async fn next_ticker(subscription: &mut Subscription) -> Vec<TickerItem> {
    loop {
        match subscription.recv().await {
            Some(LiveEvent::Ticker(items)) => return items,
            Some(LiveEvent::Aggregate(_)) => continue,
            other => panic!("expected ticker, got {:?}", other),
        }
    }
}

/// Everything a callback subscriber was told, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Aggregate(Aggregate),
    Ticker(Vec<TickerItem>),
    Failed(StoreError),
    Closed,
}

#[derive(Clone, Default)]
pub struct Recorder {
    pub seen: Arc<Mutex<Vec<Seen>>>,
}

impl Recorder {
    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

impl FeedHandler for Recorder {
    fn on_aggregate(&self, aggregate: &Aggregate) {
        self.seen.lock().unwrap().push(Seen::Aggregate(aggregate.clone()));
    }

    fn on_ticker(&self, items: &[TickerItem]) {
        self.seen.lock().unwrap().push(Seen::Ticker(items.to_vec()));
    }

    fn on_failed(&self, error: &StoreError) {
        self.seen.lock().unwrap().push(Seen::Failed(error.clone()));
    }

    fn on_closed(&self) {
        self.seen.lock().unwrap().push(Seen::Closed);
    }
}
