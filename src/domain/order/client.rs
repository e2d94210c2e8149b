//! Orders sub-client: place, cancel, list.

use crate::client::VenueClient;
use crate::domain::order::wire::{
    CancelResponse, OrderRequest, OrderResponse, PlacedOrderResponse,
};
use crate::domain::order::{NewOrder, OrderAck};
use crate::error::SdkError;
use crate::http::{CallOptions, RetryPolicy};
use tokio_util::sync::CancellationToken;

pub struct Orders<'a> {
    pub(crate) client: &'a VenueClient,
}

impl<'a> Orders<'a> {
    /// Submit an order once.
    ///
    /// Without a session this fails with `Unauthenticated` before any request is
    /// made. Any non-success status is returned as `Rejected { status, body }`.
    /// A 2xx ack only needs an `id`; omitted fields are taken from `order`.
    pub async fn place(&self, order: &NewOrder) -> Result<OrderAck, SdkError> {
        self.place_inner(order, None).await
    }

    pub async fn place_with_cancel(
        &self,
        order: &NewOrder,
        cancel: &CancellationToken,
    ) -> Result<OrderAck, SdkError> {
        self.place_inner(order, Some(cancel)).await
    }

    async fn place_inner(
        &self,
        order: &NewOrder,
        cancel: Option<&CancellationToken>,
    ) -> Result<OrderAck, SdkError> {
        let token = self.client.require_token().await?;
        let url = self.client.http.api_url("/orders/");
        let body = OrderRequest::from(order);

        let result = self
            .client
            .http
            .post::<PlacedOrderResponse, _>(
                &url,
                &body,
                CallOptions::authed(&token).with_cancel(cancel),
                RetryPolicy::None,
            )
            .await;
        let resp = self
            .client
            .check_auth(&token, result)
            .await
            .map_err(|e| e.into_rejection())?;

        let ack = resp.into_ack(order);
        tracing::info!(
            order_id = ack.id,
            side = %ack.side,
            price = %ack.price,
            quantity = ack.quantity,
            status = %ack.status,
            "Order placed"
        );
        Ok(ack)
    }

    /// Cancel a resting order. Not retried.
    pub async fn cancel(&self, order_id: i64) -> Result<String, SdkError> {
        self.cancel_inner(order_id, None).await
    }

    pub async fn cancel_with_cancel(
        &self,
        order_id: i64,
        cancel: &CancellationToken,
    ) -> Result<String, SdkError> {
        self.cancel_inner(order_id, Some(cancel)).await
    }

    async fn cancel_inner(
        &self,
        order_id: i64,
        cancel: Option<&CancellationToken>,
    ) -> Result<String, SdkError> {
        let token = self.client.require_token().await?;
        let url = self.client.http.api_url(&format!("/orders/{}", order_id));

        let result = self
            .client
            .http
            .delete::<CancelResponse>(
                &url,
                CallOptions::authed(&token).with_cancel(cancel),
                RetryPolicy::None,
            )
            .await;
        let resp = self
            .client
            .check_auth(&token, result)
            .await
            .map_err(|e| e.into_rejection())?;

        tracing::info!(order_id, "Order cancelled");
        Ok(resp.message)
    }

    /// The caller's orders, newest page first as the venue orders them.
    pub async fn list(&self, skip: u32, limit: u32) -> Result<Vec<OrderAck>, SdkError> {
        self.list_inner(skip, limit, None).await
    }

    pub async fn list_with_cancel(
        &self,
        skip: u32,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<OrderAck>, SdkError> {
        self.list_inner(skip, limit, Some(cancel)).await
    }

    async fn list_inner(
        &self,
        skip: u32,
        limit: u32,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<OrderAck>, SdkError> {
        let token = self.client.require_token().await?;
        let url = self
            .client
            .http
            .api_url(&format!("/orders/?skip={}&limit={}", skip, limit));

        let result = self
            .client
            .http
            .get::<Vec<OrderResponse>>(
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

        Ok(resp.into_iter().map(OrderAck::from).collect())
    }
}
