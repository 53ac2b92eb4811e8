//! Engine configuration

use std::time::Duration;

use crate::aggregate::StopWords;

/// Default number of buffered events per session before a slow subscriber lags
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Default ticker length
pub const DEFAULT_TICKER_CAPACITY: usize = 5;

/// Default time a ticker item stays visible
pub const DEFAULT_TICKER_DWELL: Duration = Duration::from_millis(7000);

/// Live engine configuration options
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// Capacity of each session's broadcast channel
    pub broadcast_capacity: usize,

    /// Maximum number of ticker items kept per session
    pub ticker_capacity: usize,

    /// How long a ticker item stays after insertion
    pub ticker_dwell: Duration,

    /// Words excluded from word cloud frequencies
    pub stop_words: StopWords,

    /// Interval of the background reaper
    pub cleanup_interval: Duration,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            ticker_capacity: DEFAULT_TICKER_CAPACITY,
            ticker_dwell: DEFAULT_TICKER_DWELL,
            stop_words: StopWords::indonesian(),
            cleanup_interval: Duration::from_secs(30),
        }
    }
}

impl LiveConfig {
    /// Set the broadcast capacity (at least 1)
    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity.max(1);
        self
    }

    /// Set the ticker length
    pub fn ticker_capacity(mut self, capacity: usize) -> Self {
        self.ticker_capacity = capacity;
        self
    }

    /// Set the ticker dwell time
    pub fn ticker_dwell(mut self, dwell: Duration) -> Self {
        self.ticker_dwell = dwell;
        self
    }

    /// Replace the stop-word list
    pub fn stop_words(mut self, stop_words: StopWords) -> Self {
        self.stop_words = stop_words;
        self
    }

    /// Set the reaper interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}
