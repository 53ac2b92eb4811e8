//! Events pushed to subscribers of a live session

use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::error::StoreError;
use crate::model::Session;
use crate::ticker::TickerItem;

/// An update broadcast to every subscriber of a session
///
/// Aggregate and ticker events carry the full current view rather than a
/// diff, so a subscriber that skipped events is still correct after the next
/// one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum LiveEvent {
    /// The aggregate was recomputed
    Aggregate(Aggregate),
    /// The ticker gained or lost items (newest first)
    Ticker(Vec<TickerItem>),
    /// The entry feed failed; the live session is terminated
    Failed(StoreError),
    /// The session was closed or deleted
    Closed,
}

impl LiveEvent {
    /// No further events follow this one
    pub fn is_terminal(&self) -> bool {
        matches!(self, LiveEvent::Failed(_) | LiveEvent::Closed)
    }
}

/// Current state handed to a new subscriber
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSnapshot {
    pub session: Session,
    pub aggregate: Aggregate,
    pub ticker: Vec<TickerItem>,
}

impl LiveSnapshot {
    /// Fold an event into the snapshot
    pub(super) fn apply(&mut self, event: &LiveEvent) {
        match event {
            LiveEvent::Aggregate(aggregate) => self.aggregate = aggregate.clone(),
            LiveEvent::Ticker(items) => self.ticker = items.clone(),
            LiveEvent::Failed(_) | LiveEvent::Closed => self.ticker.clear(),
        }
    }
}
