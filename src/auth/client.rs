//! Auth sub-client: login, logout, signup, session reads.

use tokio_util::sync::CancellationToken;

use crate::auth::{LoginForm, Session, SignupRequest, TokenResponse, UserProfile};
use crate::client::VenueClient;
use crate::error::{AuthError, HttpError, SdkError};
use crate::http::{CallOptions, RetryPolicy};

/// Sub-client for authentication operations.
pub struct Auth<'a> {
    pub(crate) client: &'a VenueClient,
}

impl<'a> Auth<'a> {
    /// Exchange credentials for a bearer token.
    ///
    /// Returns `Ok(false)` when the venue refuses the credentials (401 or another
    /// 4xx); the session is left as it was. A 429 is `Err(RateLimited)`, as are
    /// transport failures and 5xx. None of the error paths touch the session.
    /// Never retried.
    pub async fn login(&self, username: &str, password: &str) -> Result<bool, SdkError> {
        self.login_inner(username, password, None).await
    }

    pub async fn login_with_cancel(
        &self,
        username: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, SdkError> {
        self.login_inner(username, password, Some(cancel)).await
    }

    async fn login_inner(
        &self,
        username: &str,
        password: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<bool, SdkError> {
        let url = self.client.http.api_url("/token");
        let form = LoginForm { username, password };

        let result: Result<TokenResponse, HttpError> = self
            .client
            .http
            .post_form(
                &url,
                &form,
                CallOptions::default().with_cancel(cancel),
                RetryPolicy::None,
            )
            .await;

        match result {
            Ok(resp) if resp.access_token.is_empty() => {
                Err(AuthError::LoginFailed("empty access token".to_string()).into())
            }
            Ok(resp) => {
                self.client.session.set_token(resp.access_token).await;
                tracing::info!(username, token_type = %resp.token_type, "Logged in");
                Ok(true)
            }
            Err(HttpError::Unauthenticated) => {
                tracing::info!(username, status = 401, "Login rejected");
                Ok(false)
            }
            Err(HttpError::Rejected { status, .. }) => {
                tracing::info!(username, status, "Login rejected");
                Ok(false)
            }
            Err(e @ HttpError::RateLimited { .. }) => {
                tracing::warn!(username, error = %e, "Login rate limited");
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Drop the local session. Idempotent, no network call.
    pub async fn logout(&self) {
        self.client.session.clear().await;
        tracing::debug!("Session cleared");
    }

    /// Register a new account. Does not log in.
    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, SdkError> {
        let url = self.client.http.api_url("/users/");
        let body = SignupRequest {
            username,
            email,
            password,
        };

        match self
            .client
            .http
            .post::<UserProfile, _>(&url, &body, CallOptions::default(), RetryPolicy::None)
            .await
        {
            Ok(profile) => Ok(profile),
            Err(HttpError::Rejected { body, .. }) => Err(AuthError::SignupRejected(body).into()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn current_token(&self) -> Option<String> {
        self.client.session.token().await
    }

    /// Immutable copy of the session at this instant.
    pub async fn session(&self) -> Session {
        self.client.session.snapshot().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.client.session.is_authenticated().await
    }
}
