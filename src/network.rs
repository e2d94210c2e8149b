//! Network URL constants for the venue API.

/// Default REST API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default order book feed URL.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/api/v1/ws/orderbook";

/// Path prefix shared by every REST endpoint.
pub const API_PREFIX: &str = "/api/v1";
