//! Wire types for the order endpoints.

use super::OrderStatus;
use crate::shared::{serde_util, Side};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/orders/`.
///
/// The venue expects `price` as a JSON number and the side under the key `type`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OrderRequest {
    #[serde(rename = "type")]
    pub side: Side,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u64,
}

/// Order record returned by `GET /orders/`.
#[derive(Deserialize, Debug, Clone)]
pub struct OrderResponse {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(rename = "type")]
    pub side: Side,
    pub price: Decimal,
    pub quantity: u64,
    pub status: OrderStatus,
    #[serde(default)]
    pub filled_quantity: u64,
    #[serde(with = "serde_util::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "serde_util::timestamp_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Acknowledgement of `POST /orders/`.
///
/// A 2xx means the order was accepted, so only `id` is required here. Anything
/// else the venue leaves out is filled from the submitted order.
#[derive(Deserialize, Debug, Clone)]
pub struct PlacedOrderResponse {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default, rename = "type")]
    pub side: Option<Side>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub quantity: Option<u64>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub filled_quantity: u64,
    #[serde(default, with = "serde_util::timestamp_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "serde_util::timestamp_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Reply to `DELETE /orders/{id}`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CancelResponse {
    #[serde(default)]
    pub message: String,
}
