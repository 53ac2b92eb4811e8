//! Live engine implementation
//!
//! The central engine that opens live sessions on demand, fans their updates
//! out to subscribers, tears them down when the last subscriber leaves, and
//! forwards participant and presenter writes to the store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use super::config::LiveConfig;
use super::event::{LiveEvent, LiveSnapshot};
use super::state::{LiveSession, LiveSessionStats};
use super::subscription::{self, FeedHandler, Subscription, SubscriptionHandle};
use super::worker::Worker;
use crate::aggregate::AggregateModel;
use crate::error::{Error, Result};
use crate::model::{Entry, EntryId, Session, SessionId};
use crate::store::{EntryUpdate, FeedbackStore, NewEntry};
use crate::ticker::LiveTicker;

/// Aggregation engine for all live sessions
///
/// Thread-safe via `RwLock`. Sessions are independent: each has its own
/// worker task and broadcast channel, and no state is shared between them.
pub struct LiveEngine {
    store: Arc<dyn FeedbackStore>,

    /// Map of session id to live state
    sessions: RwLock<HashMap<SessionId, Arc<LiveSession>>>,

    next_subscription_id: AtomicU64,

    config: LiveConfig,
}

impl LiveEngine {
    /// Create an engine with default configuration
    pub fn new(store: Arc<dyn FeedbackStore>) -> Self {
        Self::with_config(store, LiveConfig::default())
    }

    /// Create an engine with custom configuration
    pub fn with_config(store: Arc<dyn FeedbackStore>, config: LiveConfig) -> Self {
        Self {
            store,
            sessions: RwLock::new(HashMap::new()),
            next_subscription_id: AtomicU64::new(1),
            config,
        }
    }

    pub fn config(&self) -> &LiveConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn FeedbackStore> {
        &self.store
    }

    /// Resolve a join code to its session
    pub async fn join(&self, code: &str) -> Result<Session> {
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::validation("join code is empty"));
        }
        self.store.find_session_by_join_code(code).await
    }

    /// Subscribe to a session's aggregate and ticker
    ///
    /// Opens the live session if this is its first subscriber, rebuilding the
    /// aggregate from the store.
    pub async fn subscribe(&self, session_id: &SessionId) -> Result<Subscription> {
        {
            let sessions = self.sessions.read().await;
            if let Some(live) = sessions.get(session_id).filter(|live| live.is_running()) {
                return Ok(self.attach(live).await);
            }
        }

        // Store round trips run outside the map lock
        let opened = self.open(session_id).await?;

        let (subscription, discarded) = {
            let mut sessions = self.sessions.write().await;
            let existing = sessions
                .get(session_id)
                .filter(|live| live.is_running())
                .cloned();

            match existing {
                // Another subscriber opened it while we were loading
                Some(live) => (self.attach(&live).await, Some(opened)),
                None => {
                    let subscription = self.attach(&opened).await;
                    let stale = sessions.insert(session_id.clone(), opened);
                    (subscription, stale)
                }
            }
        };

        if let Some(live) = discarded {
            self.shutdown(&live).await;
        }

        Ok(subscription)
    }

    /// Subscribe with callbacks
    ///
    /// The handler first receives the current aggregate (and ticker, if not
    /// empty), then every subsequent change, on a dedicated task.
    pub async fn subscribe_with<H: FeedHandler>(
        &self,
        session_id: &SessionId,
        handler: H,
    ) -> Result<SubscriptionHandle> {
        let subscription = self.subscribe(session_id).await?;
        let id = subscription.id();
        let task = tokio::spawn(subscription::drive(subscription, handler));

        Ok(SubscriptionHandle {
            id,
            session_id: session_id.clone(),
            task,
        })
    }

    /// Detach a subscription
    ///
    /// Other subscribers are unaffected. Detaching the last one tears the live
    /// session down.
    pub async fn unsubscribe(&self, subscription: Subscription) {
        let session_id = subscription.session_id().clone();
        let id = subscription.id();
        drop(subscription);

        tracing::debug!(session = %session_id, subscription = id, "Subscriber removed");
        self.release(&session_id).await;
    }

    /// Detach a callback-driven subscription
    pub async fn unsubscribe_handle(&self, handle: SubscriptionHandle) {
        let SubscriptionHandle {
            id,
            session_id,
            task,
        } = handle;

        // Wait for the task to drop its receiver before counting subscribers
        task.abort();
        let _ = task.await;

        tracing::debug!(session = %session_id, subscription = id, "Subscriber removed");
        self.release(&session_id).await;
    }

    /// Close a live session regardless of subscribers
    ///
    /// Subscribers receive `LiveEvent::Closed`. Returns false if the session
    /// was not live.
    pub async fn close_session(&self, session_id: &SessionId) -> bool {
        let live = self.sessions.write().await.remove(session_id);

        match live {
            Some(live) => {
                live.stop_worker().await;
                live.publish(LiveEvent::Closed).await;
                self.store.unsubscribe_entries(live.feed().clone()).await;

                tracing::info!(
                    session = %session_id,
                    subscribers = live.subscriber_count(),
                    "Live session closed"
                );
                true
            }
            None => false,
        }
    }

    /// Submit a participant entry
    pub async fn submit(&self, session_id: &SessionId, text: &str) -> Result<Entry> {
        if text.trim().is_empty() {
            return Err(Error::validation("entry text is empty"));
        }

        let session = self.store.get_session(session_id).await?;
        if !session.is_active {
            return Err(Error::validation("session is not accepting entries"));
        }

        let entry = self
            .store
            .append_entry(session_id, NewEntry::new(text))
            .await?;

        tracing::debug!(session = %session_id, entry = %entry.id, "Entry submitted");
        Ok(entry)
    }

    /// Add one vote to a question
    ///
    /// Every call adds exactly one vote; there is no per-voter deduplication.
    pub async fn upvote(&self, session_id: &SessionId, entry_id: &EntryId) -> Result<Entry> {
        self.require_qanda(session_id).await?;

        let entry = self
            .store
            .update_entry(session_id, entry_id, EntryUpdate::Upvote)
            .await?;

        tracing::debug!(
            session = %session_id,
            entry = %entry_id,
            upvotes = entry.upvotes,
            "Entry upvoted"
        );
        Ok(entry)
    }

    /// Attach the presenter's answer to a question, replacing any earlier one
    pub async fn answer(
        &self,
        session_id: &SessionId,
        entry_id: &EntryId,
        answer_text: &str,
    ) -> Result<Entry> {
        if answer_text.trim().is_empty() {
            return Err(Error::validation("answer text is empty"));
        }
        self.require_qanda(session_id).await?;

        let entry = self
            .store
            .update_entry(
                session_id,
                entry_id,
                EntryUpdate::Answer {
                    text: answer_text.to_string(),
                },
            )
            .await?;

        tracing::debug!(session = %session_id, entry = %entry_id, "Entry answered");
        Ok(entry)
    }

    /// Current snapshot of a live session
    pub async fn snapshot(&self, session_id: &SessionId) -> Option<LiveSnapshot> {
        let live = self.sessions.read().await.get(session_id).cloned()?;
        Some(live.snapshot().await)
    }

    /// Get live session statistics
    pub async fn session_stats(&self, session_id: &SessionId) -> Option<LiveSessionStats> {
        let live = self.sessions.read().await.get(session_id).cloned()?;
        let ticker_len = live.snapshot().await.ticker.len();

        Some(LiveSessionStats {
            session_type: live.session.session_type,
            subscriber_count: live.subscriber_count(),
            entry_count: live.entry_count(),
            ticker_len,
            state: live.state(),
            age: live.opened_at.elapsed(),
        })
    }

    /// Number of sessions currently live
    pub async fn live_session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Run cleanup once
    ///
    /// Removes live sessions that:
    /// - Have no subscribers left (subscriptions dropped without unsubscribing)
    /// - Have a terminated worker (feed failed or session removed)
    pub async fn cleanup(&self) {
        let removed: Vec<Arc<LiveSession>> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<SessionId> = sessions
                .iter()
                .filter(|(_, live)| live.subscriber_count() == 0 || !live.is_running())
                .map(|(id, _)| id.clone())
                .collect();

            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };

        for live in removed {
            self.shutdown(&live).await;
            tracing::info!(session = %live.session.id, "Live session removed by cleanup");
        }
    }

    /// Spawn background cleanup task
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let engine = Arc::clone(self);
        let interval = engine.config.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                engine.cleanup().await;
            }
        })
    }

    /// Load the session, open its feed, and start its worker
    async fn open(&self, session_id: &SessionId) -> Result<Arc<LiveSession>> {
        let session = self.store.get_session(session_id).await?;
        let feed = self.store.subscribe_entries(session_id).await?;

        let model = AggregateModel::for_session(session.session_type, &self.config.stop_words);
        let snapshot = LiveSnapshot {
            aggregate: model.recompute(&feed.initial),
            ticker: Vec::new(),
            session,
        };

        let live = Arc::new(LiveSession::new(snapshot, feed.handle, &self.config));
        let entries = feed.initial.len();

        let worker = Worker::new(
            Arc::clone(&live),
            model,
            feed.initial,
            LiveTicker::new(self.config.ticker_capacity, self.config.ticker_dwell),
            feed.changes,
        );
        live.set_worker(tokio::spawn(worker.run()));

        tracing::info!(
            session = %session_id,
            kind = %live.session.session_type,
            entries,
            "Live session opened"
        );

        Ok(live)
    }

    async fn attach(&self, live: &LiveSession) -> Subscription {
        let (rx, snapshot) = live.attach().await;
        let id = self.next_subscription_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            session = %live.session.id,
            subscription = id,
            subscribers = live.subscriber_count(),
            "Subscriber added"
        );

        Subscription::new(id, live.session.id.clone(), snapshot, rx)
    }

    /// Tear down a live session if nobody is subscribed any more
    async fn release(&self, session_id: &SessionId) {
        let live = {
            let mut sessions = self.sessions.write().await;
            let idle = sessions
                .get(session_id)
                .is_some_and(|live| live.subscriber_count() == 0);
            if !idle {
                return;
            }
            sessions.remove(session_id)
        };

        if let Some(live) = live {
            self.shutdown(&live).await;
            tracing::info!(session = %session_id, "Live session torn down, no subscribers");
        }
    }

    async fn shutdown(&self, live: &LiveSession) {
        live.stop_worker().await;
        self.store.unsubscribe_entries(live.feed().clone()).await;
    }

    async fn require_qanda(&self, session_id: &SessionId) -> Result<()> {
        let session = self.store.get_session(session_id).await?;
        if !session.is_qanda() {
            return Err(Error::validation(format!(
                "session {} is not a Q&A session",
                session_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_test::assert_ok;

    use super::*;
    use crate::error::StoreError;
    use crate::model::SessionType;
    use crate::store::{MemoryStore, NewSession};

    async fn engine_with(kind: SessionType) -> (Arc<MemoryStore>, LiveEngine, Session) {
        let store = Arc::new(MemoryStore::new());
        let session = store
            .create_session(NewSession::new("Test", kind, "TEST1"))
            .await
            .unwrap();
        let engine = LiveEngine::new(store.clone());
        (store, engine, session)
    }

    async fn next_aggregate(subscription: &mut Subscription) -> crate::aggregate::Aggregate {
        loop {
            match subscription.recv().await {
                Some(LiveEvent::Aggregate(aggregate)) => return aggregate,
                Some(_) => continue,
                None => panic!("subscription ended"),
            }
        }
    }

    #[tokio::test]
    async fn test_subscribe_unsubscribe() {
        let (store, engine, session) = engine_with(SessionType::WordCloud).await;

        let subscription = engine.subscribe(&session.id).await.unwrap();
        assert_eq!(engine.live_session_count().await, 1);
        assert_eq!(store.feed_count(&session.id).await, 1);

        let stats = engine.session_stats(&session.id).await.unwrap();
        assert_eq!(stats.subscriber_count, 1);

        engine.unsubscribe(subscription).await;
        assert_eq!(engine.live_session_count().await, 0);
        assert_eq!(store.feed_count(&session.id).await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_unknown_session() {
        let (_store, engine, _) = engine_with(SessionType::WordCloud).await;

        let err = engine
            .subscribe(&SessionId::new("missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(engine.live_session_count().await, 0);
    }

    #[tokio::test]
    async fn test_submit_updates_word_cloud() {
        let (_store, engine, session) = engine_with(SessionType::WordCloud).await;
        let mut subscription = engine.subscribe(&session.id).await.unwrap();
        assert!(subscription
            .snapshot()
            .aggregate
            .as_word_cloud()
            .unwrap()
            .insufficient);

        engine.submit(&session.id, "Rust rocks").await.unwrap();

        let aggregate = next_aggregate(&mut subscription).await;
        let cloud = aggregate.as_word_cloud().unwrap();
        assert_eq!(cloud.count("rust"), Some(1));
        assert_eq!(cloud.count("rocks"), Some(1));
    }

    #[tokio::test]
    async fn test_one_subscriber_leaving_keeps_others() {
        let (_store, engine, session) = engine_with(SessionType::QAndA).await;
        let first = engine.subscribe(&session.id).await.unwrap();
        let mut second = engine.subscribe(&session.id).await.unwrap();

        engine.unsubscribe(first).await;
        assert_eq!(engine.live_session_count().await, 1);

        engine.submit(&session.id, "Still here?").await.unwrap();
        let aggregate = next_aggregate(&mut second).await;
        assert_eq!(aggregate.as_questions().unwrap().presenter.len(), 1);
    }

    #[tokio::test]
    async fn test_close_session_notifies_subscribers() {
        let (store, engine, session) = engine_with(SessionType::QAndA).await;
        let mut subscription = engine.subscribe(&session.id).await.unwrap();

        assert!(engine.close_session(&session.id).await);
        assert!(!engine.close_session(&session.id).await);

        assert_eq!(subscription.recv().await, Some(LiveEvent::Closed));
        assert_eq!(subscription.recv().await, None);
        assert_eq!(store.feed_count(&session.id).await, 0);
    }

    #[tokio::test]
    async fn test_feed_dropped_by_store_fails_subscribers() {
        let (store, engine, session) = engine_with(SessionType::WordCloud).await;
        let mut subscription = engine.subscribe(&session.id).await.unwrap();

        // Close the feed from the store side without any message
        let live = engine.sessions.read().await.get(&session.id).cloned().unwrap();
        store.unsubscribe_entries(live.feed().clone()).await;

        let event = tokio::time::timeout(Duration::from_millis(500), subscription.recv())
            .await
            .unwrap();
        assert_eq!(
            event,
            Some(LiveEvent::Failed(StoreError::new("entry feed ended")))
        );
        assert_eq!(subscription.recv().await, None);
        assert!(!live.is_running());

        // The next subscriber gets a working live session again
        let mut fresh = engine.subscribe(&session.id).await.unwrap();
        engine.submit(&session.id, "found word").await.unwrap();
        let aggregate = next_aggregate(&mut fresh).await;
        assert_eq!(aggregate.as_word_cloud().unwrap().count("found"), Some(1));
        assert_eq!(store.feed_count(&session.id).await, 1);
    }

    #[tokio::test]
    async fn test_engine_teardown_does_not_report_failure() {
        let (_store, engine, session) = engine_with(SessionType::QAndA).await;
        let mut subscription = engine.subscribe(&session.id).await.unwrap();

        assert!(engine.close_session(&session.id).await);

        assert_eq!(subscription.recv().await, Some(LiveEvent::Closed));
        assert_eq!(subscription.recv().await, None);
    }

    #[tokio::test]
    async fn test_concurrent_first_subscribers_share_one_session() {
        let (store, engine, session) = engine_with(SessionType::WordCloud).await;

        let (first, second) = tokio::join!(
            engine.subscribe(&session.id),
            engine.subscribe(&session.id)
        );
        let first = first.unwrap();
        let second = second.unwrap();

        assert_eq!(engine.live_session_count().await, 1);
        assert_eq!(store.feed_count(&session.id).await, 1);
        let stats = engine.session_stats(&session.id).await.unwrap();
        assert_eq!(stats.subscriber_count, 2);

        engine.unsubscribe(first).await;
        engine.unsubscribe(second).await;
        assert_eq!(engine.live_session_count().await, 0);
        assert_eq!(store.feed_count(&session.id).await, 0);
    }

    #[tokio::test]
    async fn test_cleanup_reaps_dropped_subscriptions() {
        let (store, engine, session) = engine_with(SessionType::WordCloud).await;
        let subscription = engine.subscribe(&session.id).await.unwrap();
        drop(subscription);

        engine.cleanup().await;

        assert_eq!(engine.live_session_count().await, 0);
        assert_eq!(store.feed_count(&session.id).await, 0);
    }

    #[tokio::test]
    async fn test_validation_rejects_before_store() {
        let (_store, engine, session) = engine_with(SessionType::QAndA).await;

        assert!(engine.submit(&session.id, "   ").await.unwrap_err().is_validation());

        let entry = assert_ok!(engine.submit(&session.id, "q").await);
        assert!(engine
            .answer(&session.id, &entry.id, "")
            .await
            .unwrap_err()
            .is_validation());
        assert!(engine.join("  ").await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_upvote_requires_qanda() {
        let (_store, engine, session) = engine_with(SessionType::WordCloud).await;
        let entry = engine.submit(&session.id, "cloudy").await.unwrap();

        let err = engine.upvote(&session.id, &entry.id).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_spawned_cleanup_task_runs() {
        let store = Arc::new(MemoryStore::new());
        let session = store
            .create_session(NewSession::new("Test", SessionType::WordCloud, "TEST1"))
            .await
            .unwrap();
        let engine = Arc::new(LiveEngine::with_config(
            store.clone(),
            LiveConfig::default().cleanup_interval(Duration::from_millis(10)),
        ));
        let handle = engine.spawn_cleanup_task();

        drop(engine.subscribe(&session.id).await.unwrap());
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(engine.live_session_count().await, 0);
        handle.abort();
    }
}
