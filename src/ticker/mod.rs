//! Live ticker of newly arrived entries
//!
//! A cosmetic, lossy feed that tells presenters "someone just said this".
//! Items are capped and expire on their own timers; nothing here is an error
//! condition.

pub mod live;
pub mod names;

pub use live::{LiveTicker, TickerItem};
pub use names::random_display_name;
