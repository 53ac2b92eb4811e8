//! Live session walkthrough
//!
//! Run with: cargo run --example live_session
//!
//! This example demonstrates:
//! - Creating a Word Cloud and a Q&A session in the in-memory store
//! - Joining by code the way a participant would
//! - A pull-style subscriber printing every event as JSON
//! - A callback subscriber implementing `FeedHandler`
//! - Ticker items expiring on their own after the dwell time
//!
//! Set `RUST_LOG=live_feedback=trace` for the engine's internal logging.

use std::sync::Arc;
use std::time::Duration;

use live_feedback::aggregate::{Aggregate, StopWords};
use live_feedback::live::{FeedHandler, LiveConfig, LiveEngine, Subscription};
use live_feedback::model::SessionType;
use live_feedback::store::{MemoryStore, NewSession};
use live_feedback::ticker::TickerItem;

/// Presenter screen that prints the top of the board
struct PresenterScreen;

impl FeedHandler for PresenterScreen {
    fn on_aggregate(&self, aggregate: &Aggregate) {
        match aggregate {
            Aggregate::WordCloud(cloud) if cloud.insufficient => {
                println!("[screen] waiting for words...");
            }
            Aggregate::WordCloud(cloud) => {
                let top: Vec<String> = cloud
                    .terms
                    .iter()
                    .take(3)
                    .map(|t| format!("{}x{}", t.term, t.count))
                    .collect();
                println!("[screen] top words: {}", top.join(", "));
            }
            Aggregate::Questions(board) => {
                for (rank, entry) in board.presenter.iter().enumerate() {
                    let mark = if entry.is_answered() { "✓" } else { " " };
                    println!(
                        "[screen] {}. [{}] {} ({} votes)",
                        rank + 1,
                        mark,
                        entry.text,
                        entry.upvotes
                    );
                }
            }
        }
    }

    fn on_ticker(&self, items: &[TickerItem]) {
        for item in items {
            println!("[screen] {} says: {}", item.display_name, item.text);
        }
    }

    fn on_closed(&self) {
        println!("[screen] session closed");
    }
}

/// Print everything already queued on a subscription
fn drain(label: &str, subscription: &mut Subscription) {
    while let Some(event) = subscription.try_recv() {
        match serde_json::to_string(&event) {
            Ok(json) => println!("[{}] {}", label, json),
            Err(e) => eprintln!("[{}] unprintable event: {}", label, e),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("live_feedback=info".parse()?)
                .add_directive("live_session=debug".parse()?),
        )
        .init();

    let store = Arc::new(MemoryStore::new());
    let config = LiveConfig::default()
        .stop_words(StopWords::indonesian().with(&StopWords::english()))
        .ticker_dwell(Duration::from_secs(2));
    let engine = Arc::new(LiveEngine::with_config(store.clone(), config));
    let cleanup = engine.spawn_cleanup_task();

    // Word Cloud
    let cloud = store
        .create_session(
            NewSession::new("Sprint retro", SessionType::WordCloud, "RETRO")
                .prompt("One word for this sprint?")
                .public(),
        )
        .await?;

    let mut presenter = engine.subscribe(&cloud.id).await?;
    let joined = engine.join("retro").await?;
    println!("Participant joined '{}' ({})", joined.title, joined.session_type);

    for text in ["Great session!", "session was great", "ok", "yang bagus"] {
        engine.submit(&joined.id, text).await?;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    drain("cloud", &mut presenter);

    // Q&A
    let qanda = store
        .create_session(NewSession::new("All hands", SessionType::QAndA, "ASKME"))
        .await?;
    let screen = engine.subscribe_with(&qanda.id, PresenterScreen).await?;

    let a = engine.submit(&qanda.id, "When is the next release?").await?;
    let b = engine.submit(&qanda.id, "Are we hiring?").await?;
    let _c = engine.submit(&qanda.id, "Any plans for a mobile app?").await?;

    for _ in 0..3 {
        engine.upvote(&qanda.id, &a.id).await?;
    }
    for _ in 0..5 {
        engine.upvote(&qanda.id, &b.id).await?;
    }
    engine
        .answer(&qanda.id, &b.id, "Yes, two backend roles are open")
        .await?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Let the ticker run dry
    tokio::time::sleep(Duration::from_millis(2500)).await;
    drain("cloud", &mut presenter);

    if let Some(stats) = engine.session_stats(&qanda.id).await {
        println!(
            "Q&A stats: subscribers={} entries={} ticker={} state={:?}",
            stats.subscriber_count, stats.entry_count, stats.ticker_len, stats.state
        );
    }

    engine.close_session(&qanda.id).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    engine.unsubscribe_handle(screen).await;

    engine.unsubscribe(presenter).await;
    println!("Live sessions left: {}", engine.live_session_count().await);

    cleanup.abort();
    Ok(())
}
