//! Subscriber side of the fan-out

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::JoinHandle;

use super::event::{LiveEvent, LiveSnapshot};
use crate::aggregate::Aggregate;
use crate::error::StoreError;
use crate::model::SessionId;
use crate::ticker::TickerItem;

/// A subscriber's view of one live session
///
/// Holds the catch-up snapshot taken at attach time and a receiver for every
/// event published afterwards. Hand it back to
/// [`LiveEngine::unsubscribe`](super::LiveEngine::unsubscribe) to detach;
/// a subscription dropped without that is reaped by
/// [`LiveEngine::cleanup`](super::LiveEngine::cleanup).
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    session_id: SessionId,
    snapshot: LiveSnapshot,
    rx: broadcast::Receiver<LiveEvent>,
    finished: bool,
}

impl Subscription {
    pub(super) fn new(
        id: u64,
        session_id: SessionId,
        snapshot: LiveSnapshot,
        rx: broadcast::Receiver<LiveEvent>,
    ) -> Self {
        Self {
            id,
            session_id,
            snapshot,
            rx,
            finished: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// State at the moment this subscription attached
    pub fn snapshot(&self) -> &LiveSnapshot {
        &self.snapshot
    }

    /// Wait for the next event
    ///
    /// Returns `None` after a terminal event (`Failed` / `Closed`) or once the
    /// live session is gone. A subscriber that falls more than the broadcast
    /// capacity behind skips the missed events; every event carries the full
    /// view, so the next one brings it up to date.
    pub async fn recv(&mut self) -> Option<LiveEvent> {
        if self.finished {
            return None;
        }

        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(self.track(event)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        session = %self.session_id,
                        subscription = self.id,
                        skipped,
                        "Subscriber lagged, skipping events"
                    );
                }
                Err(RecvError::Closed) => {
                    self.finished = true;
                    return None;
                }
            }
        }
    }

    /// Take the next event if one is already queued
    pub fn try_recv(&mut self) -> Option<LiveEvent> {
        if self.finished {
            return None;
        }

        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(self.track(event)),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => {
                    self.finished = true;
                    return None;
                }
            }
        }
    }

    fn track(&mut self, event: LiveEvent) -> LiveEvent {
        if event.is_terminal() {
            self.finished = true;
        }
        event
    }
}

/// Callbacks for a subscription driven by the engine
///
/// Callbacks run on the subscription's own task, one event at a time.
pub trait FeedHandler: Send + Sync + 'static {
    /// The session's aggregate changed (also called once with the catch-up state)
    fn on_aggregate(&self, aggregate: &Aggregate);

    /// The ticker changed (also called once with the catch-up state)
    fn on_ticker(&self, items: &[TickerItem]);

    /// The entry feed failed; no further callbacks follow
    fn on_failed(&self, error: &StoreError) {
        let _ = error;
    }

    /// The session was closed; no further callbacks follow
    fn on_closed(&self) {}
}

/// Handle to a callback-driven subscription
#[derive(Debug)]
pub struct SubscriptionHandle {
    pub(super) id: u64,
    pub(super) session_id: SessionId,
    pub(super) task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Whether the delivery task has ended (after a terminal event)
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Deliver catch-up state, then every event, to a handler
pub(super) async fn drive<H: FeedHandler>(mut subscription: Subscription, handler: H) {
    let snapshot = subscription.snapshot().clone();
    handler.on_aggregate(&snapshot.aggregate);
    if !snapshot.ticker.is_empty() {
        handler.on_ticker(&snapshot.ticker);
    }

    while let Some(event) = subscription.recv().await {
        match event {
            LiveEvent::Aggregate(aggregate) => handler.on_aggregate(&aggregate),
            LiveEvent::Ticker(items) => handler.on_ticker(&items),
            LiveEvent::Failed(error) => handler.on_failed(&error),
            LiveEvent::Closed => handler.on_closed(),
        }
    }
}
