//! Native feed connection: `tokio-tungstenite`.
//!
//! One background tokio task per feed URL:
//! - Connect with a timeout, racing the release signal
//! - Decode each text frame and hand it to the snapshot reconciler
//! - Answer protocol pings, ignore binary frames
//! - Idle timeout while open
//! - Exponential backoff reconnection with jitter, longer cap after a policy close
//!
//! The task is the only writer of its feed's [`FeedState`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::domain::orderbook::{ApplyOutcome, OrderBookSnapshot};
use crate::error::WsError;
use crate::shared::FeedUrl;
use crate::ws::subscriptions::FeedSignal;
use crate::ws::{FeedState, StreamConfig};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Close code the venue uses for policy violations and rate limiting.
const POLICY_CLOSE: u16 = 1008;

// ─── Disconnect reasons for reconnection decision ────────────────────────────

enum Disconnect {
    /// Last subscriber left.
    Released,
    Lost(WsError),
}

// ─── Background task ─────────────────────────────────────────────────────────

/// Drive one feed until it is released or the reconnect policy gives up.
pub(crate) async fn run_feed(
    url: FeedUrl,
    config: StreamConfig,
    state: Arc<watch::Sender<FeedState>>,
    cancel: CancellationToken,
) {
    loop {
        // ── 1. Attempt connection ────────────────────────────────────────
        signal(&state, FeedSignal::ConnectStarted);
        tracing::info!(url = %url, "Connecting feed");

        let connected = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(url = %url, "Feed released while connecting");
                return;
            }
            result = attempt_connect(url.as_str(), config.connect_timeout) => result,
        };

        // ── 2. Connected: read until the connection breaks ───────────────
        let disconnect = match connected {
            Ok((sink, stream)) => {
                state.send_modify(|s| {
                    s.status = next_status(s, FeedSignal::Opened);
                    s.last_error = None;
                });
                tracing::info!(url = %url, "Feed open");
                run_connected(&url, &config, &state, sink, stream, &cancel).await
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Feed connection failed");
                Disconnect::Lost(e)
            }
        };

        let error = match disconnect {
            Disconnect::Released => return,
            Disconnect::Lost(e) => e,
        };

        // ── 3. Post-disconnect decision ──────────────────────────────────
        let rate_limited = matches!(
            error,
            WsError::Closed {
                code: Some(POLICY_CLOSE),
                ..
            }
        );
        let failures = state.borrow().attempts;

        if !config.should_reconnect(failures) {
            state.send_modify(|s| {
                s.status = next_status(s, FeedSignal::Dropped);
                s.status = next_status(s, FeedSignal::Exhausted);
                s.last_error = Some(error.clone());
            });
            tracing::error!(
                url = %url,
                attempts = failures,
                error = %error,
                "Feed failed; reconnect policy exhausted"
            );
            return;
        }

        let attempt = failures + 1;
        state.send_modify(|s| {
            s.status = next_status(s, FeedSignal::Dropped);
            s.attempts = attempt;
            s.last_error = Some(error.clone());
        });

        let delay = config.reconnect_delay(attempt, rate_limited);
        tracing::info!(
            url = %url,
            attempt,
            max = config.max_attempts,
            delay_ms = delay.as_millis() as u64,
            rate_limited,
            "Reconnecting feed"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(url = %url, "Feed released during backoff");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// The inner connected loop. Runs until the connection breaks or is released.
async fn run_connected(
    url: &FeedUrl,
    config: &StreamConfig,
    state: &watch::Sender<FeedState>,
    mut sink: SplitSink<WsStream, Message>,
    mut stream: SplitStream<WsStream>,
    cancel: &CancellationToken,
) -> Disconnect {
    let idle_enabled = config.idle_timeout.is_some();
    let idle_dur = config.idle_timeout.unwrap_or(Duration::from_secs(86400));
    let idle_sleep = tokio::time::sleep(idle_dur);
    tokio::pin!(idle_sleep);
    // `attempts` survives the handshake; a server that accepts and hangs up
    // straight away must still hit the reconnect limit.
    let mut delivered = false;

    loop {
        tokio::select! {
            biased;

            // ── a) Released by the manager ───────────────────────────────
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(Some(CloseFrame {
                    code: CloseCode::Normal,
                    reason: "Client unsubscribed".into(),
                }))).await;
                tracing::debug!(url = %url, "Feed released; socket closed");
                return Disconnect::Released;
            }

            // ── b) Incoming WS message ───────────────────────────────────
            msg = stream.next() => {
                idle_sleep.as_mut().reset(tokio::time::Instant::now() + idle_dur);
                if !delivered && matches!(&msg, Some(Ok(m)) if !m.is_close()) {
                    delivered = true;
                    state.send_if_modified(|s| std::mem::take(&mut s.attempts) > 0);
                }
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_text(url, state, text.as_str());
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = extract_close(frame.as_ref());
                        tracing::info!(url = %url, code, reason = %reason, "Feed closed by server");
                        return Disconnect::Lost(WsError::Closed {
                            code: Some(code),
                            reason,
                        });
                    }
                    Some(Ok(_)) => {} // Binary, Pong, Frame: ignore
                    Some(Err(e)) => {
                        tracing::error!(url = %url, error = %e, "Feed transport error");
                        return Disconnect::Lost(WsError::ConnectionFailed(e.to_string()));
                    }
                    None => {
                        tracing::warn!(url = %url, "Feed stream ended");
                        return Disconnect::Lost(WsError::Closed {
                            code: None,
                            reason: "Stream ended".into(),
                        });
                    }
                }
            }

            // ── c) Idle timeout ──────────────────────────────────────────
            () = &mut idle_sleep, if idle_enabled => {
                let ms = idle_dur.as_millis() as u64;
                tracing::warn!(url = %url, idle_ms = ms, "Feed idle; treating as dead");
                let _ = sink.close().await;
                return Disconnect::Lost(WsError::IdleTimeout(ms));
            }
        }
    }
}

/// Decode one frame and offer it to the reconciler. Bad frames are counted and
/// dropped; the last good snapshot is kept.
fn handle_text(url: &FeedUrl, state: &watch::Sender<FeedState>, text: &str) {
    match OrderBookSnapshot::decode(text, Utc::now()) {
        Ok(snapshot) => {
            state.send_if_modified(|s| matches!(s.book.apply(snapshot), ApplyOutcome::Applied));
        }
        Err(e) => {
            tracing::warn!(url = %url, error = %e, raw = %text, "Dropping undecodable frame");
            state.send_modify(|s| s.dropped_frames += 1);
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn next_status(state: &FeedState, signal: FeedSignal) -> crate::ws::FeedStatus {
    match state.status.on(signal) {
        Some(next) => next,
        None => {
            tracing::debug!(status = %state.status, ?signal, "Ignoring feed transition");
            state.status
        }
    }
}

fn signal(state: &watch::Sender<FeedState>, signal: FeedSignal) {
    state.send_modify(|s| s.status = next_status(s, signal));
}

/// Attempt to establish a WebSocket connection within `timeout`.
async fn attempt_connect(
    url: &str,
    timeout: Duration,
) -> Result<(SplitSink<WsStream, Message>, SplitStream<WsStream>), WsError> {
    let (ws_stream, _) = tokio::time::timeout(timeout, connect_async(url))
        .await
        .map_err(|_| WsError::ConnectTimeout)?
        .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

    Ok(ws_stream.split())
}

/// Extract close code and reason from an optional CloseFrame.
fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1005, "No close frame".into()),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
