//! Trades sub-client: trade history queries.

use crate::client::VenueClient;
use crate::domain::trade::wire::TradeResponse;
use crate::domain::trade::Trade;
use crate::error::SdkError;
use crate::http::CallOptions;
use tokio_util::sync::CancellationToken;

pub struct Trades<'a> {
    pub(crate) client: &'a VenueClient,
}

impl<'a> Trades<'a> {
    /// Full trade history for the session's user.
    ///
    /// Fails with `Unauthenticated` (no session, or a 401) or
    /// `ServerError { status, body }` for any other failed status.
    pub async fn history(&self) -> Result<Vec<Trade>, SdkError> {
        self.history_inner(None).await
    }

    pub async fn history_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Trade>, SdkError> {
        self.history_inner(Some(cancel)).await
    }

    async fn history_inner(
        &self,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Trade>, SdkError> {
        let token = self.client.require_token().await?;
        let url = self.client.http.api_url("/trades/");

        let result = self
            .client
            .http
            .get::<Vec<TradeResponse>>(
                &url,
                CallOptions::authed(&token).with_cancel(cancel),
                self.client.read_policy(),
            )
            .await;
        let resp = self
            .client
            .check_auth(&token, result)
            .await
            .map_err(|e| e.into_server_error())?;

        tracing::debug!(count = resp.len(), "Fetched trade history");
        Ok(resp.into_iter().map(Trade::from).collect())
    }
}
