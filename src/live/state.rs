//! Per-session live state
//!
//! This module defines the state the engine keeps for each session that
//! currently has subscribers.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::config::LiveConfig;
use super::event::{LiveEvent, LiveSnapshot};
use crate::model::{Session, SessionType};
use crate::store::FeedHandle;

/// Lifecycle of a live session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveState {
    /// Worker is draining the entry feed
    Running,
    /// Worker stopped (feed failed, session removed, or closed)
    Terminated,
}

/// Live state of one session
///
/// The aggregate itself is owned by the session's worker; this struct only
/// holds what subscribers need: the fan-out sender and the last published
/// snapshot for catch-up.
pub struct LiveSession {
    /// Session metadata as loaded when the live session opened
    pub session: Session,

    /// Broadcast sender for fan-out to subscribers
    tx: broadcast::Sender<LiveEvent>,

    /// Last published state, updated under the same lock as each send
    snapshot: RwLock<LiveSnapshot>,

    /// Store feed driving the worker
    feed: FeedHandle,

    /// Worker task, taken on teardown
    worker: Mutex<Option<JoinHandle<()>>>,

    /// Entries currently known to the worker
    entry_count: AtomicUsize,

    terminated: AtomicBool,

    /// When the live session was opened
    pub opened_at: Instant,
}

impl LiveSession {
    pub(super) fn new(snapshot: LiveSnapshot, feed: FeedHandle, config: &LiveConfig) -> Self {
        let (tx, _) = broadcast::channel(config.broadcast_capacity);

        Self {
            session: snapshot.session.clone(),
            tx,
            snapshot: RwLock::new(snapshot),
            feed,
            worker: Mutex::new(None),
            entry_count: AtomicUsize::new(0),
            terminated: AtomicBool::new(false),
            opened_at: Instant::now(),
        }
    }

    /// Number of attached subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn state(&self) -> LiveState {
        if self.terminated.load(Ordering::Acquire) {
            LiveState::Terminated
        } else {
            LiveState::Running
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == LiveState::Running
    }

    pub(super) fn feed(&self) -> &FeedHandle {
        &self.feed
    }

    /// Current snapshot
    pub async fn snapshot(&self) -> LiveSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Attach a subscriber
    ///
    /// The receiver is created while the snapshot is read-locked, so the
    /// subscriber sees every event published after its catch-up state and
    /// none published before it.
    pub(super) async fn attach(&self) -> (broadcast::Receiver<LiveEvent>, LiveSnapshot) {
        let snapshot = self.snapshot.read().await;
        (self.tx.subscribe(), snapshot.clone())
    }

    /// Record an event and send it to all subscribers
    ///
    /// Returns the number of subscribers that received it.
    pub(super) async fn publish(&self, event: LiveEvent) -> usize {
        let mut snapshot = self.snapshot.write().await;
        snapshot.apply(&event);
        self.tx.send(event).unwrap_or(0)
    }

    pub(super) fn set_entry_count(&self, count: usize) {
        self.entry_count.store(count, Ordering::Relaxed);
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count.load(Ordering::Relaxed)
    }

    pub(super) fn mark_terminated(&self) {
        self.terminated.store(true, Ordering::Release);
    }

    pub(super) fn set_worker(&self, handle: JoinHandle<()>) {
        let mut worker = self.worker.lock().unwrap_or_else(|e| e.into_inner());
        *worker = Some(handle);
    }

    /// Abort the worker and wait until it is gone
    ///
    /// Pending ticker expiries live inside the worker, so they are discarded
    /// with it.
    pub(super) async fn stop_worker(&self) {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }
        self.mark_terminated();
    }
}

/// Statistics for a live session
#[derive(Debug, Clone)]
pub struct LiveSessionStats {
    pub session_type: SessionType,
    /// Number of attached subscribers
    pub subscriber_count: usize,
    /// Entries folded into the aggregate
    pub entry_count: usize,
    /// Items currently on the ticker
    pub ticker_len: usize,
    pub state: LiveState,
    /// Time since the live session opened
    pub age: std::time::Duration,
}
