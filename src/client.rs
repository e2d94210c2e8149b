//! High-level client: `VenueClient` with nested sub-client accessors.
//!
//! Each domain has its own sub-client in `domain/<name>/client.rs`.
//! This module keeps the builder, the shared session and stream manager, and the
//! accessor methods.

use crate::auth::client::Auth;
use crate::auth::SessionStore;
use crate::domain::order::client::Orders;
use crate::domain::trade::client::Trades;
use crate::error::{HttpError, SdkError};
use crate::http::client::DEFAULT_TIMEOUT;
use crate::http::{RetryConfig, RetryPolicy, VenueHttp};
use crate::shared::FeedUrl;

#[cfg(feature = "ws-native")]
use crate::ws::{manager::FeedHandle, StreamConfig, StreamManager};

use std::time::Duration;

// Re-export sub-client types for convenience.
pub use crate::auth::client::Auth as AuthClient;
pub use crate::domain::order::client::Orders as OrdersClient;
pub use crate::domain::trade::client::Trades as TradesClient;

/// The primary entry point for the venue SDK.
///
/// `client.auth()`, `client.orders()`, `client.trades()` for REST;
/// `client.subscribe_orderbook()` for the live feed.
#[derive(Clone)]
pub struct VenueClient {
    pub(crate) http: VenueHttp,
    pub(crate) session: SessionStore,
    pub(crate) read_retry: RetryConfig,
    #[cfg(feature = "ws-native")]
    pub(crate) streams: StreamManager,
    ws_url: FeedUrl,
}

impl VenueClient {
    pub fn builder() -> VenueClientBuilder {
        VenueClientBuilder::default()
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn auth(&self) -> Auth<'_> {
        Auth { client: self }
    }

    pub fn orders(&self) -> Orders<'_> {
        Orders { client: self }
    }

    pub fn trades(&self) -> Trades<'_> {
        Trades { client: self }
    }

    // ── Streams ──────────────────────────────────────────────────────────

    /// The stream manager shared by every clone of this client.
    #[cfg(feature = "ws-native")]
    pub fn streams(&self) -> &StreamManager {
        &self.streams
    }

    /// Subscribe to the configured order book feed. Must be called inside a Tokio
    /// runtime.
    #[cfg(feature = "ws-native")]
    pub fn subscribe_orderbook(&self) -> FeedHandle {
        self.streams.subscribe(&self.ws_url)
    }

    pub fn ws_url(&self) -> &FeedUrl {
        &self.ws_url
    }

    pub fn session_store(&self) -> &SessionStore {
        &self.session
    }

    // ── Internal helpers for sub-clients ─────────────────────────────────

    /// Token snapshot for an authenticated call, or `Unauthenticated` without
    /// touching the network.
    pub(crate) async fn require_token(&self) -> Result<String, HttpError> {
        match self.session.token().await {
            Some(token) => Ok(token),
            None => Err(HttpError::Unauthenticated),
        }
    }

    /// Apply the auth-failure teardown rule to the outcome of an authenticated call.
    pub(crate) async fn check_auth<T>(
        &self,
        token: &str,
        result: Result<T, HttpError>,
    ) -> Result<T, HttpError> {
        if let Err(HttpError::Unauthenticated) = &result {
            if self.session.clear_if_current(token).await {
                tracing::warn!("Server rejected bearer token; session cleared");
            }
        }
        result
    }

    pub(crate) fn read_policy(&self) -> RetryPolicy {
        RetryPolicy::Custom(self.read_retry.clone())
    }
}

impl std::fmt::Debug for VenueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VenueClient")
            .field("base_url", &self.http.base_url())
            .field("ws_url", &self.ws_url)
            .finish_non_exhaustive()
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct VenueClientBuilder {
    base_url: String,
    ws_url: String,
    timeout: Duration,
    token: Option<String>,
    read_retry: RetryConfig,
    #[cfg(feature = "ws-native")]
    stream_config: StreamConfig,
}

impl Default for VenueClientBuilder {
    fn default() -> Self {
        Self {
            base_url: crate::network::DEFAULT_API_URL.to_string(),
            ws_url: crate::network::DEFAULT_WS_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            token: None,
            read_retry: RetryConfig::idempotent(),
            #[cfg(feature = "ws-native")]
            stream_config: StreamConfig::default(),
        }
    }
}

impl VenueClientBuilder {
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn ws_url(mut self, url: &str) -> Self {
        self.ws_url = url.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Restore a persisted bearer token on construction.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Retry behavior for reads (`GET`). Writes are never retried.
    pub fn read_retry(mut self, config: RetryConfig) -> Self {
        self.read_retry = config;
        self
    }

    #[cfg(feature = "ws-native")]
    pub fn stream_config(mut self, config: StreamConfig) -> Self {
        self.stream_config = config;
        self
    }

    pub fn build(self) -> Result<VenueClient, SdkError> {
        let session = SessionStore::with_token(self.token.filter(|t| !t.is_empty()));
        Ok(VenueClient {
            http: VenueHttp::with_timeout(&self.base_url, self.timeout)?,
            session,
            read_retry: self.read_retry,
            #[cfg(feature = "ws-native")]
            streams: StreamManager::new(self.stream_config),
            ws_url: FeedUrl::from(self.ws_url),
        })
    }
}
