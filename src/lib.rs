//! # Venue SDK
//!
//! Rust client for a trading venue: a live order book feed kept consistent under
//! reconnects, plus an authenticated REST surface for orders and trade history.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core**: Shared newtypes, domain models, snapshot reconciliation (always available)
//! 2. **Auth**: Bearer session store, login/logout/signup
//! 3. **HTTP API**: `VenueHttp` with per-call retry policies and cancellation
//! 4. **WebSocket**: `tokio-tungstenite` feed tasks behind a shared `StreamManager`
//! 5. **High-Level Client**: `VenueClient` with nested sub-clients
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use venue_sdk::prelude::*;
//!
//! let client = VenueClient::builder()
//!     .base_url("http://localhost:8000")
//!     .build()?;
//!
//! if client.auth().login("alice", "secret").await? {
//!     let order = NewOrder::buy(Decimal::new(1050, 2), 3)?;
//!     let ack = client.orders().place(&order).await?;
//! }
//!
//! let mut feed = client.subscribe_orderbook();
//! feed.wait_for(|s| s.snapshot().is_some()).await?;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes used across all domains.
pub mod shared;

/// Domain modules (vertical slices): types, wire types, conversions, state.
pub mod domain;

/// Unified SDK error types.
pub mod error;

/// Network URL constants.
pub mod network;

// ── Layer 2: Auth ────────────────────────────────────────────────────────────

/// Authentication: session store, login/logout, signup.
pub mod auth;

// ── Layer 3: HTTP API ────────────────────────────────────────────────────────

/// HTTP client with retry policies.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 4: WebSocket ───────────────────────────────────────────────────────

/// Feed status, reconnect config, subscription tracking and the stream manager.
pub mod ws;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `VenueClient`, the primary entry point.
#[cfg(feature = "http")]
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared newtypes
    pub use crate::shared::{FeedUrl, Side};
    pub use rust_decimal::Decimal;

    // Domain types: orderbook
    pub use crate::domain::orderbook::{
        ApplyOutcome, BookValidationError, BookView, OrderBookSnapshot, PriceLevel,
        SnapshotReconciler,
    };

    // Domain types: order, trade
    pub use crate::domain::order::{
        NewOrder, OrderAck, OrderStatus, OrderValidationError,
    };
    pub use crate::domain::trade::Trade;

    // Errors
    pub use crate::error::{AuthError, HttpError, SdkError, WsError};

    // Network
    pub use crate::network::{DEFAULT_API_URL, DEFAULT_WS_URL};

    // Auth
    pub use crate::auth::{Session, SessionStore, UserProfile};

    // HTTP client + sub-clients
    #[cfg(feature = "http")]
    pub use crate::client::{
        AuthClient, OrdersClient, TradesClient, VenueClient, VenueClientBuilder,
    };
    #[cfg(feature = "http")]
    pub use crate::http::retry::{RetryConfig, RetryPolicy};

    // Streams
    pub use crate::ws::{FeedState, FeedStatus, StreamConfig};
    #[cfg(feature = "ws-native")]
    pub use crate::ws::{FeedHandle, StreamManager};
}
