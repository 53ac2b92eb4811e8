//! Live aggregation engine
//!
//! The engine keeps one live session per session that currently has
//! subscribers. Each live session owns a worker task that drains the store's
//! change feed, recomputes the aggregate, maintains the ticker, and publishes
//! through `tokio::sync::broadcast` so every subscriber gets every update.
//!
//! # Architecture
//!
//! ```text
//!   submit / upvote / answer
//!             │
//!             ▼
//!     ┌───────────────┐   change feed   ┌──────────────────────────┐
//!     │ FeedbackStore │ ──────────────► │ Worker (one per session) │
//!     └───────────────┘   (mpsc, FIFO)  │   entries + model        │
//!                                       │   LiveTicker + timers    │
//!                                       └────────────┬─────────────┘
//!                                                    │ publish()
//!                                                    ▼
//!                                   LiveSession { snapshot, broadcast::Tx }
//!                                                    │
//!                     ┌──────────────────────────────┼──────────────────┐
//!                     ▼                              ▼                  ▼
//!              [Subscription]                 [Subscription]     [FeedHandler]
//!              recv().await                   recv().await       on_aggregate()
//! ```
//!
//! # Lifecycle
//!
//! - The first `subscribe` for a session loads it, opens the entry feed, and
//!   computes the aggregate from scratch.
//! - The last `unsubscribe` aborts the worker (discarding pending ticker
//!   expiries) and closes the feed.
//! - `close_session`, a deleted session, or a failed feed end the live session
//!   with a terminal event to every subscriber.

pub mod config;
pub mod engine;
pub mod event;
pub mod state;
pub mod subscription;
mod worker;

pub use config::LiveConfig;
pub use engine::LiveEngine;
pub use event::{LiveEvent, LiveSnapshot};
pub use state::{LiveSession, LiveSessionStats, LiveState};
pub use subscription::{FeedHandler, Subscription, SubscriptionHandle};
