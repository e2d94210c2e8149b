//! Stream manager against an in-process WebSocket server.
//!
//! The mock venue counts TCP connections and pushes whatever the test tells it
//! to: snapshot frames, garbage, close frames, pings, or an abrupt drop.

#![cfg(feature = "ws-native")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use rust_decimal::Decimal;
use venue_sdk::error::WsError;
use venue_sdk::shared::FeedUrl;
use venue_sdk::ws::{FeedHandle, FeedState, FeedStatus, StreamConfig, StreamManager};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Mock venue ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum Push {
    Text(String),
    Ping,
    Close(u16),
    Drop,
}

struct MockVenue {
    url: String,
    connections: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
    pongs: Arc<AtomicUsize>,
    push: broadcast::Sender<Push>,
}

impl MockVenue {
    async fn start() -> Self {
        Self::start_with_greeting(None).await
    }

    /// `greeting` is sent to every connection right after the handshake.
    async fn start_with_greeting(greeting: Option<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("listener should expose address");
        let (push, _) = broadcast::channel::<Push>(64);

        let venue = MockVenue {
            url: format!("ws://{}/api/v1/ws/orderbook", addr),
            connections: Arc::new(AtomicUsize::new(0)),
            active: Arc::new(AtomicUsize::new(0)),
            pongs: Arc::new(AtomicUsize::new(0)),
            push: push.clone(),
        };

        let connections = Arc::clone(&venue.connections);
        let active = Arc::clone(&venue.active);
        let pongs = Arc::clone(&venue.pongs);
        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                connections.fetch_add(1, Ordering::SeqCst);
                let mut rx = push.subscribe();
                let active = Arc::clone(&active);
                let pongs = Arc::clone(&pongs);
                let greeting = greeting.clone();

                tokio::spawn(async move {
                    let Ok(ws) = tokio_tungstenite::accept_async(tcp).await else {
                        return;
                    };
                    active.fetch_add(1, Ordering::SeqCst);
                    let (mut sink, mut stream) = ws.split();

                    if let Some(text) = greeting {
                        let _ = sink.send(Message::Text(text.into())).await;
                    }

                    loop {
                        tokio::select! {
                            cmd = rx.recv() => match cmd {
                                Ok(Push::Text(text)) => {
                                    if sink.send(Message::Text(text.into())).await.is_err() {
                                        break;
                                    }
                                }
                                Ok(Push::Ping) => {
                                    let _ = sink.send(Message::Ping(vec![1, 2, 3].into())).await;
                                }
                                Ok(Push::Close(code)) => {
                                    let _ = sink
                                        .send(Message::Close(Some(CloseFrame {
                                            code: CloseCode::from(code),
                                            reason: "server close".into(),
                                        })))
                                        .await;
                                    break;
                                }
                                Ok(Push::Drop) | Err(_) => break,
                            },
                            msg = stream.next() => match msg {
                                Some(Ok(Message::Pong(_))) => {
                                    pongs.fetch_add(1, Ordering::SeqCst);
                                }
                                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                                Some(Ok(_)) => {}
                            },
                        }
                    }

                    active.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        venue
    }

    fn send(&self, push: Push) {
        let _ = self.push.send(push);
    }

    fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Accepts TCP and hangs up before the WebSocket handshake.
async fn refusing_listener() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("listener should expose address");
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);
    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(tcp);
        }
    });
    (format!("ws://{}/api/v1/ws/orderbook", addr), accepted)
}

/// Completes the handshake, then immediately closes with `code`.
async fn closing_listener(code: u16) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("listener should expose address");
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);
    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else {
                    return;
                };
                let _ = ws
                    .send(Message::Close(Some(CloseFrame {
                        code: CloseCode::from(code),
                        reason: "go away".into(),
                    })))
                    .await;
                // Drain until the client hangs up.
                while let Some(Ok(_)) = ws.next().await {}
            });
        }
    });
    (format!("ws://{}/api/v1/ws/orderbook", addr), accepted)
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn fast_config() -> StreamConfig {
    StreamConfig {
        base_delay: Duration::from_millis(20),
        max_delay: Duration::from_millis(100),
        connect_timeout: Duration::from_secs(2),
        jitter: false,
        ..StreamConfig::default()
    }
}

/// Backoff long enough for a test to observe `Closed` before the retry.
fn observable_config() -> StreamConfig {
    StreamConfig {
        base_delay: Duration::from_millis(300),
        max_delay: Duration::from_millis(300),
        ..fast_config()
    }
}

async fn wait_for(handle: &mut FeedHandle, pred: impl FnMut(&FeedState) -> bool) -> FeedState {
    timeout(TEST_TIMEOUT, handle.wait_for(pred))
        .await
        .expect("timed out waiting for feed state")
        .expect("feed released unexpectedly")
}

async fn eventually(mut check: impl FnMut() -> bool) {
    timeout(TEST_TIMEOUT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition never became true");
}

fn frame(bid: &str, ask: &str) -> String {
    format!(
        r#"{{"bids":[{{"price":{bid},"quantity":3}}],"asks":[{{"price":{ask},"quantity":2}}]}}"#
    )
}

fn stamped(bid: &str, timestamp: &str) -> String {
    format!(r#"{{"bids":[{{"price":{bid},"quantity":1}}],"asks":[],"timestamp":"{timestamp}"}}"#)
}

fn best_bid(state: &FeedState) -> Option<Decimal> {
    state.snapshot().and_then(|s| s.best_bid())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reference_frame_reaches_subscriber() {
    let venue = MockVenue::start().await;
    let manager = StreamManager::new(fast_config());
    let mut handle = manager.subscribe(venue.url.as_str());
    assert!(handle.view().is_awaiting());

    wait_for(&mut handle, |s| s.status == FeedStatus::Open).await;
    venue.send(Push::Text(frame("10.5", "10.7")));

    let state = wait_for(&mut handle, |s| s.snapshot().is_some()).await;
    let snap = state.snapshot().unwrap();
    assert_eq!(snap.bids[0].price, Decimal::new(105, 1));
    assert_eq!(snap.bids[0].quantity, Decimal::from(3));
    assert_eq!(snap.asks[0].price, Decimal::new(107, 1));
    assert_eq!(venue_sdk::shared::fmt::price(&snap.bids[0].price), "10.50");
    assert_eq!(venue_sdk::shared::fmt::price(&snap.asks[0].price), "10.70");
}

#[tokio::test]
async fn test_two_subscribers_share_one_connection() {
    let venue = MockVenue::start().await;
    let manager = StreamManager::new(fast_config());
    let url = FeedUrl::from(venue.url.as_str());

    let mut first = manager.subscribe(venue.url.as_str());
    let mut second = manager.subscribe(venue.url.as_str());
    wait_for(&mut first, |s| s.status == FeedStatus::Open).await;
    wait_for(&mut second, |s| s.status == FeedStatus::Open).await;
    assert_eq!(venue.connections(), 1);
    assert_eq!(manager.subscriber_count(&url), 2);

    manager.unsubscribe(first);
    assert_eq!(manager.subscriber_count(&url), 1);

    // The remaining subscriber still receives frames on the same socket.
    venue.send(Push::Text(frame("11", "12")));
    let state = wait_for(&mut second, |s| s.snapshot().is_some()).await;
    assert_eq!(best_bid(&state), Some(Decimal::from(11)));
    assert_eq!(venue.active(), 1);

    drop(second);
    assert!(manager.active_feeds().is_empty());
    eventually(|| venue.active() == 0).await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(venue.connections(), 1, "no reconnect after teardown");
}

#[tokio::test]
async fn test_garbage_frame_is_dropped_and_feed_survives() {
    let venue = MockVenue::start().await;
    let manager = StreamManager::new(fast_config());
    let mut handle = manager.subscribe(venue.url.as_str());
    wait_for(&mut handle, |s| s.status == FeedStatus::Open).await;

    venue.send(Push::Text(frame("10", "11")));
    wait_for(&mut handle, |s| best_bid(s) == Some(Decimal::from(10))).await;

    venue.send(Push::Text("{definitely not json".into()));
    venue.send(Push::Text(r#"{"bids":[{"price":-4,"quantity":1}],"asks":[]}"#.into()));
    let state = wait_for(&mut handle, |s| s.dropped_frames == 2).await;
    assert_eq!(best_bid(&state), Some(Decimal::from(10)), "last good snapshot kept");
    assert_eq!(state.status, FeedStatus::Open);

    venue.send(Push::Text(frame("12", "13")));
    let state = wait_for(&mut handle, |s| best_bid(s) == Some(Decimal::from(12))).await;
    assert_eq!(state.status, FeedStatus::Open);
    assert_eq!(venue.connections(), 1);
}

#[tokio::test]
async fn test_out_of_order_snapshot_is_discarded() {
    let venue = MockVenue::start().await;
    let manager = StreamManager::new(fast_config());
    let mut handle = manager.subscribe(venue.url.as_str());
    wait_for(&mut handle, |s| s.status == FeedStatus::Open).await;

    venue.send(Push::Text(stamped("20", "2024-01-01T00:00:10Z")));
    venue.send(Push::Text(stamped("5", "2024-01-01T00:00:05Z")));
    venue.send(Push::Text(stamped("21", "2024-01-01T00:00:10Z")));

    let state = wait_for(&mut handle, |s| best_bid(s) == Some(Decimal::from(21))).await;
    assert_eq!(state.book.discarded(), 1);
}

#[tokio::test]
async fn test_reconnects_after_server_drop_and_keeps_last_snapshot() {
    let venue = MockVenue::start().await;
    let manager = StreamManager::new(observable_config());
    let mut handle = manager.subscribe(venue.url.as_str());
    wait_for(&mut handle, |s| s.status == FeedStatus::Open).await;

    venue.send(Push::Text(frame("10", "11")));
    wait_for(&mut handle, |s| s.snapshot().is_some()).await;

    venue.send(Push::Drop);
    let closed = wait_for(&mut handle, |s| s.status == FeedStatus::Closed).await;
    assert_eq!(best_bid(&closed), Some(Decimal::from(10)));
    assert!(closed.last_error.is_some());

    eventually(|| venue.connections() == 2).await;
    let reopened = wait_for(&mut handle, |s| s.status == FeedStatus::Open).await;
    assert_eq!(reopened.attempts, 1, "attempts kept until the new socket delivers");
    assert!(reopened.last_error.is_none());
    assert_eq!(best_bid(&reopened), Some(Decimal::from(10)));

    venue.send(Push::Text(frame("11", "12")));
    let healthy = wait_for(&mut handle, |s| best_bid(s) == Some(Decimal::from(11))).await;
    assert_eq!(healthy.attempts, 0);
}

#[tokio::test]
async fn test_greeting_snapshot_after_reconnect_replaces_book() {
    let venue = MockVenue::start_with_greeting(Some(frame("30", "31"))).await;
    let manager = StreamManager::new(observable_config());
    let mut handle = manager.subscribe(venue.url.as_str());
    wait_for(&mut handle, |s| best_bid(s) == Some(Decimal::from(30))).await;

    venue.send(Push::Text(frame("40", "41")));
    wait_for(&mut handle, |s| best_bid(s) == Some(Decimal::from(40))).await;

    venue.send(Push::Close(1001));
    let state = wait_for(&mut handle, |s| s.status == FeedStatus::Closed).await;
    assert!(matches!(
        state.last_error,
        Some(WsError::Closed { code: Some(1001), .. })
    ));

    // Full replacement: the greeting sent on the new connection wins.
    wait_for(&mut handle, |s| {
        s.status == FeedStatus::Open && best_bid(s) == Some(Decimal::from(30))
    })
    .await;
}

#[tokio::test]
async fn test_policy_close_is_recorded() {
    let venue = MockVenue::start().await;
    let manager = StreamManager::new(observable_config());
    let mut handle = manager.subscribe(venue.url.as_str());
    wait_for(&mut handle, |s| s.status == FeedStatus::Open).await;

    venue.send(Push::Close(1008));
    let state = wait_for(&mut handle, |s| s.status == FeedStatus::Closed).await;
    assert!(matches!(
        state.last_error,
        Some(WsError::Closed { code: Some(1008), .. })
    ));
    assert_eq!(state.attempts, 1);
}

#[tokio::test]
async fn test_idle_feed_is_reconnected() {
    let venue = MockVenue::start().await;
    let manager = StreamManager::new(StreamConfig {
        idle_timeout: Some(Duration::from_millis(150)),
        ..observable_config()
    });
    let mut handle = manager.subscribe(venue.url.as_str());
    wait_for(&mut handle, |s| s.status == FeedStatus::Open).await;

    let state = wait_for(&mut handle, |s| s.status == FeedStatus::Closed).await;
    assert_eq!(state.last_error, Some(WsError::IdleTimeout(150)));
    eventually(|| venue.connections() >= 2).await;
}

#[tokio::test]
async fn test_server_ping_is_answered() {
    let venue = MockVenue::start().await;
    let manager = StreamManager::new(fast_config());
    let mut handle = manager.subscribe(venue.url.as_str());
    wait_for(&mut handle, |s| s.status == FeedStatus::Open).await;

    venue.send(Push::Ping);
    eventually(|| venue.pongs.load(Ordering::SeqCst) >= 1).await;
    assert_eq!(handle.status(), FeedStatus::Open);
}

#[tokio::test]
async fn test_fails_after_max_attempts_then_revives() {
    let (url, accepted) = refusing_listener().await;
    let manager = StreamManager::new(StreamConfig {
        max_attempts: 2,
        ..fast_config()
    });

    let mut handle = manager.subscribe(url.as_str());
    let state = wait_for(&mut handle, |s| s.status == FeedStatus::Failed).await;
    assert_eq!(state.attempts, 2);
    assert!(state.last_error.is_some());
    assert!(state.view().is_awaiting());

    // Initial connect plus two reconnects, then nothing.
    eventually(|| accepted.load(Ordering::SeqCst) == 3).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 3);

    // A new subscriber re-triggers the connection.
    let mut revived = manager.subscribe(url.as_str());
    eventually(|| accepted.load(Ordering::SeqCst) > 3).await;
    wait_for(&mut revived, |s| s.status == FeedStatus::Failed).await;
    assert_eq!(manager.subscriber_count(&FeedUrl::from(url.as_str())), 2);
}

#[tokio::test]
async fn test_accept_then_policy_close_still_exhausts() {
    let (url, accepted) = closing_listener(1008).await;
    let manager = StreamManager::new(StreamConfig {
        max_attempts: 2,
        ..fast_config()
    });

    let mut handle = manager.subscribe(url.as_str());
    let state = wait_for(&mut handle, |s| s.status == FeedStatus::Failed).await;
    assert_eq!(state.attempts, 2);
    assert!(matches!(
        state.last_error,
        Some(WsError::Closed { code: Some(1008), .. })
    ));
    assert_eq!(accepted.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_resubscribe_after_shutdown_gets_working_feed() {
    let venue = MockVenue::start().await;
    let manager = StreamManager::new(fast_config());
    let url = FeedUrl::from(venue.url.as_str());

    let mut old = manager.subscribe(venue.url.as_str());
    let old_clone = old.clone();
    wait_for(&mut old, |s| s.status == FeedStatus::Open).await;

    manager.shutdown();
    eventually(|| venue.active() == 0).await;

    let mut fresh = manager.subscribe(venue.url.as_str());
    wait_for(&mut fresh, |s| s.status == FeedStatus::Open).await;
    assert_eq!(venue.connections(), 2);

    // Handles from before the shutdown leave without touching the new feed.
    drop(old);
    drop(old_clone);
    assert_eq!(manager.subscriber_count(&url), 1);

    venue.send(Push::Text(frame("9", "10")));
    let state = wait_for(&mut fresh, |s| s.snapshot().is_some()).await;
    assert_eq!(best_bid(&state), Some(Decimal::from(9)));
    assert_eq!(state.status, FeedStatus::Open);
    assert_eq!(venue.connections(), 2);
    assert_eq!(venue.active(), 1);
}

#[tokio::test]
async fn test_unsubscribe_during_backoff_cancels_reconnect() {
    let (url, accepted) = refusing_listener().await;
    let manager = StreamManager::new(StreamConfig {
        max_attempts: 0,
        ..observable_config()
    });

    let mut handle = manager.subscribe(url.as_str());
    wait_for(&mut handle, |s| s.status == FeedStatus::Closed).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 1);

    drop(handle);
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 1, "backoff timer was cancelled");
}

#[tokio::test]
async fn test_distinct_urls_get_distinct_connections() {
    let a = MockVenue::start().await;
    let b = MockVenue::start().await;
    let manager = StreamManager::new(fast_config());

    let mut ha = manager.subscribe(a.url.as_str());
    let mut hb = manager.subscribe(b.url.as_str());
    wait_for(&mut ha, |s| s.status == FeedStatus::Open).await;
    wait_for(&mut hb, |s| s.status == FeedStatus::Open).await;

    b.send(Push::Text(frame("7", "8")));
    wait_for(&mut hb, |s| s.snapshot().is_some()).await;
    assert!(ha.snapshot().is_none());
    assert_eq!(manager.active_feeds().len(), 2);
    assert_eq!((a.connections(), b.connections()), (1, 1));
}
