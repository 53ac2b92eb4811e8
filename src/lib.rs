//! Live aggregation engine for audience feedback sessions
//!
//! A presenter opens a Word Cloud or Q&A session; participants join with a
//! short code and submit text or upvotes. This crate turns the stream of
//! submissions into live aggregates and pushes them to every presenter-side
//! subscriber:
//!
//! - Word Cloud sessions: a ranked term-frequency table
//! - Q&A sessions: questions ranked for the presenter and for participants
//! - Both: a short-lived ticker of freshly arrived entries
//!
//! Persistence sits behind [`store::FeedbackStore`]. The in-memory aggregate
//! is a cache that can always be rebuilt from the store.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use live_feedback::live::{LiveEngine, LiveEvent};
//! use live_feedback::model::SessionType;
//! use live_feedback::store::{MemoryStore, NewSession};
//!
//! # async fn example() -> live_feedback::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let session = store
//!     .create_session(NewSession::new("Retro", SessionType::WordCloud, "RETRO"))
//!     .await?;
//!
//! let engine = LiveEngine::new(store.clone());
//! let mut subscription = engine.subscribe(&session.id).await?;
//!
//! engine.submit(&session.id, "great session").await?;
//!
//! while let Some(event) = subscription.recv().await {
//!     if let LiveEvent::Aggregate(aggregate) = event {
//!         println!("{:?}", aggregate);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod error;
pub mod live;
pub mod model;
pub mod store;
pub mod ticker;

pub use error::{Error, Missing, Result, StoreError};
pub use live::{LiveConfig, LiveEngine, LiveEvent, Subscription};
