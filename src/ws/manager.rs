//! Stream connection manager: one shared connection per feed URL.
//!
//! `subscribe` hands out a [`FeedHandle`]; the first handle for a URL spawns the
//! connection task, the last one dropped cancels it. Handles observe the feed
//! through a `watch` channel and never write to it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::domain::orderbook::{BookView, OrderBookSnapshot};
use crate::error::WsError;
use crate::shared::FeedUrl;
use crate::ws::subscriptions::{FeedSignal, Release, SubscriptionRegistry};
use crate::ws::{native, FeedState, FeedStatus, StreamConfig};

// ─── Per-feed runtime ────────────────────────────────────────────────────────

struct FeedRuntime {
    state: Arc<watch::Sender<FeedState>>,
    cancel: CancellationToken,
    /// Distinguishes this entry from earlier ones for the same URL.
    generation: u64,
}

impl FeedRuntime {
    fn status(&self) -> FeedStatus {
        self.state.borrow().status
    }
}

struct Inner {
    config: StreamConfig,
    feeds: Mutex<SubscriptionRegistry<FeedRuntime>>,
    next_generation: AtomicU64,
}

impl Inner {
    fn acquire(&self, url: &FeedUrl) -> (watch::Receiver<FeedState>, u64) {
        let mut feeds = self.feeds.lock();
        let (runtime, created) = feeds.acquire(url, || FeedRuntime {
            state: Arc::new(watch::channel(FeedState::default()).0),
            cancel: CancellationToken::new(),
            generation: self.next_generation.fetch_add(1, Ordering::Relaxed),
        });

        if created {
            tracing::debug!(url = %url, "First subscriber; opening feed");
            self.spawn(url, runtime);
        } else if runtime.status() == FeedStatus::Failed {
            tracing::info!(url = %url, "New subscriber for failed feed; retrying");
            runtime.state.send_modify(|s| {
                s.status = s.status.on(FeedSignal::Revived).unwrap_or(FeedStatus::Idle);
                s.attempts = 0;
            });
            runtime.cancel = CancellationToken::new();
            self.spawn(url, runtime);
        }

        (runtime.state.subscribe(), runtime.generation)
    }

    fn spawn(&self, url: &FeedUrl, runtime: &FeedRuntime) {
        let task = native::run_feed(
            url.clone(),
            self.config.clone(),
            Arc::clone(&runtime.state),
            runtime.cancel.clone(),
        );
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(_) => {
                tracing::error!(url = %url, "subscribe called outside a Tokio runtime");
                runtime.state.send_modify(|s| {
                    s.status = FeedStatus::Failed;
                    s.last_error = Some(WsError::ConnectionFailed(
                        "no Tokio runtime available".to_string(),
                    ));
                });
            }
        }
    }

    fn release(&self, url: &FeedUrl, generation: u64) {
        let released = self
            .feeds
            .lock()
            .release_if(url, |runtime| runtime.generation == generation);
        match released {
            Release::Closed(runtime) => {
                tracing::debug!(url = %url, "Last subscriber left; closing feed");
                runtime.cancel.cancel();
            }
            Release::Retained(remaining) => {
                tracing::debug!(url = %url, remaining, "Subscriber left");
            }
            Release::Unknown => {
                tracing::trace!(url = %url, generation, "Released handle outlived its feed");
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        for (_, runtime) in self.feeds.get_mut().drain() {
            runtime.cancel.cancel();
        }
    }
}

// ─── StreamManager ───────────────────────────────────────────────────────────

/// Shares one connection per feed URL between any number of subscribers.
///
/// Cloning is cheap; clones share the same feeds.
#[derive(Clone)]
pub struct StreamManager {
    inner: Arc<Inner>,
}

impl StreamManager {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                feeds: Mutex::new(SubscriptionRegistry::new()),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.inner.config
    }

    /// Subscribe to `url`. Does not wait for the connection.
    ///
    /// Must be called from within a Tokio runtime; otherwise the returned handle
    /// reports `Failed` immediately.
    pub fn subscribe(&self, url: impl Into<FeedUrl>) -> FeedHandle {
        let url = url.into();
        let (rx, generation) = self.inner.acquire(&url);
        FeedHandle {
            url,
            rx,
            generation,
            inner: Arc::clone(&self.inner),
        }
    }

    /// Release a handle. Same as dropping it.
    pub fn unsubscribe(&self, handle: FeedHandle) {
        drop(handle);
    }

    /// URLs with at least one subscriber.
    pub fn active_feeds(&self) -> Vec<FeedUrl> {
        self.inner.feeds.lock().urls()
    }

    pub fn subscriber_count(&self, url: &FeedUrl) -> usize {
        self.inner.feeds.lock().ref_count(url)
    }

    /// Tear down every feed. Outstanding handles keep their last state and see
    /// `WsError::Released` from `changed()`. Dropping them later does not affect
    /// feeds subscribed after the shutdown.
    pub fn shutdown(&self) {
        let drained = self.inner.feeds.lock().drain();
        for (url, runtime) in drained {
            tracing::debug!(url = %url, "Shutting down feed");
            runtime.cancel.cancel();
        }
    }
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new(StreamConfig::default())
    }
}

impl std::fmt::Debug for StreamManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamManager")
            .field("active_feeds", &self.active_feeds())
            .finish()
    }
}

// ─── FeedHandle ──────────────────────────────────────────────────────────────

/// One subscriber's view of a feed. Dropping it unsubscribes.
///
/// Cloning registers another subscriber for the same URL.
pub struct FeedHandle {
    url: FeedUrl,
    rx: watch::Receiver<FeedState>,
    generation: u64,
    inner: Arc<Inner>,
}

impl FeedHandle {
    pub fn url(&self) -> &FeedUrl {
        &self.url
    }

    pub fn status(&self) -> FeedStatus {
        self.rx.borrow().status
    }

    /// Latest snapshot, or "awaiting first snapshot".
    pub fn view(&self) -> BookView {
        self.rx.borrow().view()
    }

    pub fn snapshot(&self) -> Option<OrderBookSnapshot> {
        self.rx.borrow().snapshot().cloned()
    }

    /// Copy of the whole observable state.
    pub fn state(&self) -> FeedState {
        self.rx.borrow().clone()
    }

    /// Wait for the next state change.
    pub async fn changed(&mut self) -> Result<(), WsError> {
        self.rx.changed().await.map_err(|_| WsError::Released)
    }

    /// Wait until `pred` holds for the current state, checking it immediately.
    pub async fn wait_for(
        &mut self,
        pred: impl FnMut(&FeedState) -> bool,
    ) -> Result<FeedState, WsError> {
        self.rx
            .wait_for(pred)
            .await
            .map(|state| state.clone())
            .map_err(|_| WsError::Released)
    }
}

impl Clone for FeedHandle {
    fn clone(&self) -> Self {
        let (rx, generation) = self.inner.acquire(&self.url);
        Self {
            url: self.url.clone(),
            rx,
            generation,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.inner.release(&self.url, self.generation);
    }
}

impl std::fmt::Debug for FeedHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedHandle")
            .field("url", &self.url)
            .field("status", &self.status())
            .finish()
    }
}
