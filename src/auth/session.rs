//! Session store: the single owner of the bearer token.

use super::Session;
use async_lock::RwLock;
use std::sync::Arc;

/// Shared, cloneable handle to the session. Clones see the same state.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a previously persisted token.
    pub fn with_token(token: Option<String>) -> Self {
        let session = match token {
            Some(t) => Session::authenticated(t),
            None => Session::anonymous(),
        };
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    pub async fn snapshot(&self) -> Session {
        self.inner.read().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.read().await.token.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.is_authenticated
    }

    pub(crate) async fn set_token(&self, token: String) {
        *self.inner.write().await = Session::authenticated(token);
    }

    pub(crate) async fn clear(&self) {
        *self.inner.write().await = Session::anonymous();
    }

    /// Clear only if the session still holds `token`.
    ///
    /// A 401 for an old token must not wipe a newer login that raced it.
    pub(crate) async fn clear_if_current(&self, token: &str) -> bool {
        let mut guard = self.inner.write().await;
        if guard.token.as_deref() == Some(token) {
            *guard = Session::anonymous();
            true
        } else {
            false
        }
    }
}
