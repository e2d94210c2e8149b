//! Authentication: credential exchange, bearer session, signup.
//!
//! ## Session Model
//!
//! - The only persisted state is the bearer token. [`session::SessionStore`] owns it.
//! - Every other component reads an immutable [`Session`] copy taken at call time
//!   and never caches the token itself.
//! - A `401` from any authenticated call clears the session.
//! - Logout is local: it drops the token and makes no network call.
//!
//! ## Session Hydration
//!
//! A token persisted by the host app is restored through
//! `VenueClient::builder().token(..)` before the first call.

#[cfg(feature = "http")]
pub mod client;
pub mod session;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::serde_util;

pub use session::SessionStore;

// ============================================================================
// Session
// ============================================================================

/// Immutable view of the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub is_authenticated: bool,
}

impl Session {
    pub fn authenticated(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            is_authenticated: true,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Form body for `POST /api/v1/token`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginForm<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Reply from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Body for `POST /api/v1/users/`.
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Account record returned by signup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(with = "serde_util::timestamp")]
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}
