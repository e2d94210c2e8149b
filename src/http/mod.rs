//! HTTP client layer: `VenueHttp` with per-call retry policies and cancellation.

pub mod client;
pub mod retry;

pub use client::{CallOptions, VenueHttp};
pub use retry::{RetryConfig, RetryPolicy};
