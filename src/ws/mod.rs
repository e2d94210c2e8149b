//! WebSocket layer: feed status, reconnect config, per-feed observable state.
//!
//! The transport lives behind the `ws-native` feature:
//! - `native.rs` drives one feed connection as a background tokio task.
//! - `manager.rs` shares one connection per URL between subscribers.
//!
//! This module and `subscriptions.rs` hold the runtime-free types.

pub mod subscriptions;

#[cfg(feature = "ws-native")]
pub mod manager;

#[cfg(feature = "ws-native")]
pub mod native;

use crate::domain::orderbook::{BookView, OrderBookSnapshot, SnapshotReconciler};
use crate::error::WsError;
use std::time::Duration;

pub use subscriptions::{FeedSignal, Release, SubscriptionRegistry};

#[cfg(feature = "ws-native")]
pub use manager::{FeedHandle, StreamManager};

// ─── FeedStatus ──────────────────────────────────────────────────────────────

/// Lifecycle of a feed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeedStatus {
    #[default]
    Idle,
    Connecting,
    Open,
    /// Lost; a reconnect may follow.
    Closed,
    /// Reconnect policy exhausted. Terminal until a new subscriber arrives.
    Failed,
}

impl FeedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedStatus::Idle => "idle",
            FeedStatus::Connecting => "connecting",
            FeedStatus::Open => "open",
            FeedStatus::Closed => "closed",
            FeedStatus::Failed => "failed",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, FeedStatus::Open)
    }
}

impl std::fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── FeedState ───────────────────────────────────────────────────────────────

/// Everything a subscriber can observe about one feed.
///
/// Written only by the feed's connection task.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    pub status: FeedStatus,
    pub book: SnapshotReconciler,
    /// Consecutive failed connection attempts. Reset once a reopened socket
    /// delivers its first frame.
    pub attempts: u32,
    pub last_error: Option<WsError>,
    /// Frames that failed to decode and were dropped.
    pub dropped_frames: u64,
}

impl FeedState {
    pub fn view(&self) -> BookView {
        self.book.view()
    }

    pub fn snapshot(&self) -> Option<&OrderBookSnapshot> {
        self.book.current()
    }
}

// ─── StreamConfig ────────────────────────────────────────────────────────────

/// Reconnect and liveness settings shared by every feed of a manager.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    pub reconnect: bool,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Cap used after a policy close (code 1008).
    pub rate_limited_max_delay: Duration,
    /// Consecutive reconnect attempts before `Failed`. 0 means unlimited.
    pub max_attempts: u32,
    pub connect_timeout: Duration,
    /// An open feed silent for this long is treated as dead. `None` disables it.
    pub idle_timeout: Option<Duration>,
    pub jitter: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            reconnect: true,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            rate_limited_max_delay: Duration::from_secs(300),
            max_attempts: 10,
            connect_timeout: Duration::from_secs(10),
            idle_timeout: Some(Duration::from_secs(30)),
            jitter: true,
        }
    }
}

impl StreamConfig {
    /// Whether another attempt is allowed after `attempts` consecutive failures.
    pub fn should_reconnect(&self, attempts: u32) -> bool {
        self.reconnect && (self.max_attempts == 0 || attempts < self.max_attempts)
    }

    /// Backoff before reconnect attempt `attempt` (1-based).
    pub fn reconnect_delay(&self, attempt: u32, rate_limited: bool) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let base_ms = (self.base_delay.as_millis() as u64).saturating_mul(1u64 << exp);

        let jitter_ms = if self.jitter && base_ms > 0 {
            rand::random::<u64>() % (base_ms / 4 + 1)
        } else {
            0
        };

        let cap = if rate_limited {
            self.rate_limited_max_delay
        } else {
            self.max_delay
        };

        Duration::from_millis(base_ms.saturating_add(jitter_ms)).min(cap)
    }
}
