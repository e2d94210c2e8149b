//! Low-level HTTP client: `VenueHttp`.
//!
//! Generic verbs plus retry and cancellation. Returns wire types; conversion to
//! domain types happens in the domain sub-clients. The bearer token is passed in
//! per call so this layer holds no session state.

use crate::error::HttpError;
use crate::http::retry::{RetryConfig, RetryPolicy};
use crate::network::API_PREFIX;

use futures_util::future::{self, Either};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-call options: the token snapshot to attach and an optional abort signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallOptions<'a> {
    pub token: Option<&'a str>,
    pub cancel: Option<&'a CancellationToken>,
}

impl<'a> CallOptions<'a> {
    pub fn authed(token: &'a str) -> Self {
        Self {
            token: Some(token),
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: Option<&'a CancellationToken>) -> Self {
        self.cancel = cancel;
        self
    }
}

enum Body<'a, B> {
    Empty,
    Json(&'a B),
    Form(&'a B),
}

/// Low-level HTTP client for the venue REST API.
#[derive(Clone)]
pub struct VenueHttp {
    base_url: String,
    client: Client,
}

impl VenueHttp {
    pub fn new(base_url: &str) -> Result<Self, HttpError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `"/orders/"`.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    // ── Verbs ────────────────────────────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        opts: CallOptions<'_>,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        let fut = self.request_with_retry(Method::GET, url, Body::<()>::Empty, opts.token, retry);
        with_cancel(fut, opts.cancel, url).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
        opts: CallOptions<'_>,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        let fut = self.request_with_retry(Method::POST, url, Body::Json(body), opts.token, retry);
        with_cancel(fut, opts.cancel, url).await
    }

    /// POST with an `application/x-www-form-urlencoded` body.
    pub async fn post_form<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        form: &B,
        opts: CallOptions<'_>,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        let fut = self.request_with_retry(Method::POST, url, Body::Form(form), opts.token, retry);
        with_cancel(fut, opts.cancel, url).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        url: &str,
        opts: CallOptions<'_>,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        let fut =
            self.request_with_retry(Method::DELETE, url, Body::<()>::Empty, opts.token, retry);
        with_cancel(fut, opts.cancel, url).await
    }

    // ── Internal ─────────────────────────────────────────────────────────

    async fn request_with_retry<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: &str,
        body: Body<'_, B>,
        token: Option<&str>,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        let config: RetryConfig = match retry.config() {
            None => return self.do_request(&method, url, &body, token).await,
            Some(config) => config,
        };

        let mut attempt = 0;
        loop {
            match self.do_request::<T, B>(&method, url, &body, token).await {
                Ok(resp) => return Ok(resp),
                Err(e) if attempt < config.max_retries && config.should_retry(&e) => {
                    let delay = config.delay_after(attempt, &e);
                    tracing::debug!(
                        attempt = attempt + 1,
                        max = config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying request to {}",
                        url
                    );
                    futures_timer::Delay::new(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn do_request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &Method,
        url: &str,
        body: &Body<'_, B>,
        token: Option<&str>,
    ) -> Result<T, HttpError> {
        let mut req = self.client.request(method.clone(), url);

        if let Some(token) = token {
            req = req.bearer_auth(token);
        }

        req = match body {
            Body::Empty => req,
            Body::Json(b) => req.json(b),
            Body::Form(b) => req.form(b),
        };

        let resp = req.send().await.map_err(classify_transport)?;
        let status = resp.status();

        if status.is_success() {
            let text = resp.text().await.map_err(classify_transport)?;
            return serde_json::from_str(&text).map_err(|e| HttpError::Decode(e.to_string()));
        }

        let retry_after_ms = retry_after_ms(&resp);
        let body_text = resp.text().await.unwrap_or_default();
        Err(classify_status(status, body_text, retry_after_ms))
    }
}

/// Map a non-success status onto the error taxonomy.
pub(crate) fn classify_status(
    status: StatusCode,
    body: String,
    retry_after_ms: Option<u64>,
) -> HttpError {
    match status.as_u16() {
        401 => HttpError::Unauthenticated,
        429 => HttpError::RateLimited { retry_after_ms },
        code @ 400..=499 => HttpError::Rejected { status: code, body },
        code => HttpError::ServerError { status: code, body },
    }
}

fn classify_transport(err: reqwest::Error) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout
    } else {
        HttpError::Reqwest(err)
    }
}

fn retry_after_ms(resp: &reqwest::Response) -> Option<u64> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| secs * 1000)
}

/// Race `fut` against `cancel`. A token that is already cancelled short-circuits
/// before any I/O.
async fn with_cancel<T>(
    fut: impl Future<Output = Result<T, HttpError>>,
    cancel: Option<&CancellationToken>,
    url: &str,
) -> Result<T, HttpError> {
    let Some(token) = cancel else {
        return fut.await;
    };
    if token.is_cancelled() {
        tracing::debug!("Request to {} cancelled before send", url);
        return Err(HttpError::Cancelled);
    }

    let cancelled = token.cancelled();
    futures_util::pin_mut!(fut);
    futures_util::pin_mut!(cancelled);
    match future::select(fut, cancelled).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => {
            tracing::debug!("Request to {} cancelled", url);
            Err(HttpError::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, String::new(), None),
            HttpError::Unauthenticated
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, String::new(), Some(2000)),
            HttpError::RateLimited {
                retry_after_ms: Some(2000)
            }
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, "missing".into(), None),
            HttpError::Rejected { status: 404, ref body } if body == "missing"
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, String::new(), None),
            HttpError::ServerError { status: 502, .. }
        ));
    }

    #[test]
    fn test_api_url_trims_trailing_slash() {
        let http = VenueHttp::new("http://localhost:8000/").unwrap();
        assert_eq!(http.base_url(), "http://localhost:8000");
        assert_eq!(http.api_url("/trades/"), "http://localhost:8000/api/v1/trades/");
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let result: Result<(), HttpError> =
            with_cancel(async { Ok(()) }, Some(&token), "http://x").await;
        assert!(matches!(result, Err(HttpError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancel_aborts_pending_future() {
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            child.cancel();
        });
        let result: Result<(), HttpError> =
            with_cancel(future::pending(), Some(&token), "http://x").await;
        assert!(matches!(result, Err(HttpError::Cancelled)));
    }
}
