//! Bounded, self-expiring feed of freshly submitted entries

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::names;
use crate::model::{Entry, EntryId};

/// One "just now" item shown to presenters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerItem {
    pub entry_id: EntryId,
    pub text: String,
    /// Random label, regenerated for every item
    pub display_name: String,
}

impl TickerItem {
    /// Build an item for an entry with a fresh random display name
    pub fn for_entry(entry: &Entry) -> Self {
        Self {
            entry_id: entry.id.clone(),
            text: entry.text.clone(),
            display_name: names::random_display_name(),
        }
    }
}

#[derive(Debug)]
struct Slot {
    item: TickerItem,
    expires_at: Instant,
}

/// Newest-first list of at most `capacity` items
///
/// Every item carries its own deadline, `dwell` after its insertion. New
/// arrivals never extend the life of older items. The ticker does not run
/// timers itself; the owner sleeps until [`next_deadline`](Self::next_deadline)
/// and calls [`expire`](Self::expire), so dropping the owner cancels every
/// pending expiry at once.
#[derive(Debug)]
pub struct LiveTicker {
    capacity: usize,
    dwell: Duration,
    slots: VecDeque<Slot>,
}

impl LiveTicker {
    pub fn new(capacity: usize, dwell: Duration) -> Self {
        Self {
            capacity,
            dwell,
            slots: VecDeque::with_capacity(capacity),
        }
    }

    /// Add an item for a newly inserted entry
    pub fn push(&mut self, entry: &Entry, now: Instant) -> TickerItem {
        let item = TickerItem::for_entry(entry);
        self.insert(item.clone(), now);
        item
    }

    /// Insert an item at the front, dropping the oldest beyond capacity
    pub fn insert(&mut self, item: TickerItem, now: Instant) {
        if self.capacity == 0 {
            return;
        }

        self.slots.push_front(Slot {
            item,
            expires_at: now + self.dwell,
        });
        self.slots.truncate(self.capacity);
    }

    /// Remove every item whose dwell time has elapsed
    ///
    /// Returns true if anything was removed.
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.expires_at > now);
        self.slots.len() != before
    }

    /// Earliest pending expiry, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().map(|slot| slot.expires_at).min()
    }

    /// Current items, newest first
    pub fn items(&self) -> Vec<TickerItem> {
        self.slots.iter().map(|slot| slot.item.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::SessionId;

    const DWELL: Duration = Duration::from_millis(7000);

    fn entry(id: &str) -> Entry {
        Entry::new(EntryId::new(id), SessionId::new("s"), id, Utc::now())
    }

    #[test]
    fn test_capacity_keeps_newest_first() {
        let mut ticker = LiveTicker::new(5, DWELL);
        let now = Instant::now();

        for i in 0..7 {
            ticker.push(&entry(&format!("e{}", i)), now);
            assert!(ticker.len() <= 5);
        }

        let ids: Vec<String> = ticker
            .items()
            .iter()
            .map(|item| item.entry_id.to_string())
            .collect();
        assert_eq!(ids, vec!["e6", "e5", "e4", "e3", "e2"]);
    }

    #[test]
    fn test_each_item_expires_on_its_own_deadline() {
        let mut ticker = LiveTicker::new(5, DWELL);
        let t0 = Instant::now();

        ticker.push(&entry("a"), t0);
        ticker.push(&entry("b"), t0 + Duration::from_millis(3000));

        assert_eq!(ticker.next_deadline(), Some(t0 + DWELL));

        assert!(!ticker.expire(t0 + Duration::from_millis(6999)));
        assert_eq!(ticker.len(), 2);

        // a goes at exactly 7000ms; b's later arrival does not extend it
        assert!(ticker.expire(t0 + DWELL));
        assert_eq!(ticker.len(), 1);
        assert_eq!(ticker.items()[0].entry_id.as_str(), "b");

        assert!(ticker.expire(t0 + Duration::from_millis(10_000)));
        assert!(ticker.is_empty());
        assert_eq!(ticker.next_deadline(), None);
    }

    #[test]
    fn test_item_carries_entry_text_and_name() {
        let mut ticker = LiveTicker::new(5, DWELL);
        let item = ticker.push(&entry("hello"), Instant::now());
        assert_eq!(item.text, "hello");
        assert!(item.display_name.contains(' '));
    }

    #[test]
    fn test_zero_capacity_holds_nothing() {
        let mut ticker = LiveTicker::new(0, DWELL);
        ticker.push(&entry("a"), Instant::now());
        assert!(ticker.is_empty());
    }
}
