//! Print the live order book top of book as snapshots arrive.
//!
//! Run: cargo run --example orderbook_feed --features native
//!
//! `VENUE_WS_URL` overrides the feed URL; `RUST_LOG` controls SDK logging.

use std::env;

use tracing_subscriber::EnvFilter;
use venue_sdk::prelude::*;
use venue_sdk::shared::fmt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("venue_sdk=info")),
        )
        .with_target(true)
        .init();

    let ws_url = env::var("VENUE_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.to_string());
    let client = VenueClient::builder().ws_url(&ws_url).build()?;
    let mut feed = client.subscribe_orderbook();
    println!("Subscribed to {}", feed.url());

    let mut last_status = feed.status();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = feed.changed() => changed?,
        }

        let state = feed.state();
        if state.status != last_status {
            println!("[{}] attempts={}", state.status, state.attempts);
            last_status = state.status;
        }

        match state.view() {
            BookView::AwaitingFirstSnapshot => println!("awaiting first snapshot..."),
            BookView::Ready(book) => {
                let bid = book.best_bid().map(|p| fmt::price(&p));
                let ask = book.best_ask().map(|p| fmt::price(&p));
                let bid_qty = book.bids.first().map(|l| fmt::quantity(&l.quantity));
                let ask_qty = book.asks.first().map(|l| fmt::quantity(&l.quantity));
                println!(
                    "{} | bid {} x {} | ask {} x {} | {} levels",
                    book.received_at.format("%H:%M:%S%.3f"),
                    bid.as_deref().unwrap_or("-"),
                    bid_qty.as_deref().unwrap_or("-"),
                    ask.as_deref().unwrap_or("-"),
                    ask_qty.as_deref().unwrap_or("-"),
                    book.bids.len() + book.asks.len(),
                );
            }
        }
    }

    client.streams().unsubscribe(feed);
    Ok(())
}
