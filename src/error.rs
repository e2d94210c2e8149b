//! Unified SDK error types.

use thiserror::Error;

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("WebSocket error: {0}")]
    Ws(#[from] WsError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Invalid order: {0}")]
    InvalidOrder(#[from] crate::domain::order::OrderValidationError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl SdkError {
    /// No session, or the server refused the bearer token.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, SdkError::Http(HttpError::Unauthenticated))
    }

    /// The server answered a mutation with a non-success status.
    pub fn is_rejected(&self) -> bool {
        matches!(self, SdkError::Http(HttpError::Rejected { .. }))
    }

    /// The caller aborted the request. Not an error condition for logging.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SdkError::Http(HttpError::Cancelled))
    }
}

/// HTTP-layer errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Rejected {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout")]
    Timeout,

    #[error("Response decode failed: {0}")]
    Decode(String),

    #[error("Cancelled")]
    Cancelled,
}

impl HttpError {
    /// Re-label any non-success status as a rejection.
    ///
    /// Orders are not idempotent, so every failed status is final for the caller.
    pub(crate) fn into_rejection(self) -> Self {
        match self {
            HttpError::ServerError { status, body } => HttpError::Rejected { status, body },
            HttpError::RateLimited { .. } => HttpError::Rejected {
                status: 429,
                body: String::new(),
            },
            other => other,
        }
    }

    /// Re-label any non-success status of a read as a server error.
    pub(crate) fn into_server_error(self) -> Self {
        match self {
            HttpError::Rejected { status, body } => HttpError::ServerError { status, body },
            HttpError::RateLimited { .. } => HttpError::ServerError {
                status: 429,
                body: String::new(),
            },
            other => other,
        }
    }
}

/// WebSocket errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WsError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection timeout")]
    ConnectTimeout,

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Connection closed: code={code:?} reason={reason}")]
    Closed { code: Option<u16>, reason: String },

    #[error("No frame received for {0}ms")]
    IdleTimeout(u64),

    #[error("Feed released")]
    Released,
}

/// Authentication errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Signup rejected: {0}")]
    SignupRejected(String),
}
