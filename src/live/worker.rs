//! Per-session worker
//!
//! One task per live session drains the store's change feed in order,
//! recomputes the aggregate, maintains the ticker, and publishes events. No
//! two recomputations for a session ever run concurrently, and nothing else
//! touches the worker's entries or ticker.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::event::LiveEvent;
use super::state::LiveSession;
use crate::aggregate::AggregateModel;
use crate::error::StoreError;
use crate::model::{ChangeKind, Entry, EntryChange, EntryId};
use crate::store::FeedMessage;
use crate::ticker::LiveTicker;

pub(super) struct Worker {
    live: Arc<LiveSession>,
    model: AggregateModel,
    /// Entries in submission order
    entries: Vec<Entry>,
    index: HashMap<EntryId, usize>,
    ticker: LiveTicker,
    changes: mpsc::UnboundedReceiver<FeedMessage>,
}

impl Worker {
    pub(super) fn new(
        live: Arc<LiveSession>,
        model: AggregateModel,
        initial: Vec<Entry>,
        ticker: LiveTicker,
        changes: mpsc::UnboundedReceiver<FeedMessage>,
    ) -> Self {
        let index = initial
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.id.clone(), i))
            .collect();
        live.set_entry_count(initial.len());

        Self {
            live,
            model,
            entries: initial,
            index,
            ticker,
            changes,
        }
    }

    pub(super) async fn run(mut self) {
        let session_id = self.live.session.id.clone();

        loop {
            let deadline = self.ticker.next_deadline();

            tokio::select! {
                message = self.changes.recv() => match message {
                    Some(FeedMessage::Changes(batch)) => self.apply(batch).await,
                    Some(FeedMessage::Failed(error)) => {
                        tracing::warn!(session = %session_id, error = %error, "Entry feed failed");
                        self.live.publish(LiveEvent::Failed(error)).await;
                        break;
                    }
                    Some(FeedMessage::Removed) => {
                        tracing::info!(session = %session_id, "Session removed from store");
                        self.live.publish(LiveEvent::Closed).await;
                        break;
                    }
                    None => {
                        // Engine teardown aborts the worker before closing the
                        // feed, so reaching this means the store dropped it
                        tracing::warn!(session = %session_id, "Entry feed ended without notice");
                        self.live
                            .publish(LiveEvent::Failed(StoreError::new("entry feed ended")))
                            .await;
                        break;
                    }
                },
                _ = sleep_until(deadline) => self.expire().await,
            }
        }

        self.live.mark_terminated();
    }

    /// Fold a change batch into the entry set and publish the results
    async fn apply(&mut self, batch: Vec<EntryChange>) {
        let now = Instant::now();
        let mut arrived = 0;

        for change in batch {
            let known = self.index.get(&change.entry.id).copied();
            match (change.kind, known) {
                (_, Some(i)) => {
                    self.entries[i] = change.entry;
                }
                (ChangeKind::Inserted, None) => {
                    self.ticker.push(&change.entry, now);
                    self.insert(change.entry);
                    arrived += 1;
                }
                (ChangeKind::Modified, None) => {
                    // Modification of an entry we never saw inserted
                    self.insert(change.entry);
                }
            }
        }

        self.live.set_entry_count(self.entries.len());

        let aggregate = self.model.recompute(&self.entries);
        let receivers = self.live.publish(LiveEvent::Aggregate(aggregate)).await;

        if arrived > 0 {
            self.live
                .publish(LiveEvent::Ticker(self.ticker.items()))
                .await;
        }

        tracing::debug!(
            session = %self.live.session.id,
            entries = self.entries.len(),
            arrived,
            subscribers = receivers,
            "Aggregate recomputed"
        );
    }

    fn insert(&mut self, entry: Entry) {
        self.index.insert(entry.id.clone(), self.entries.len());
        self.entries.push(entry);
    }

    async fn expire(&mut self) {
        if self.ticker.expire(Instant::now()) {
            self.live
                .publish(LiveEvent::Ticker(self.ticker.items()))
                .await;
        }
    }
}

/// Sleep until the deadline, or forever if there is none
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
