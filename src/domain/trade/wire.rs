//! Wire types for trade history responses.

use crate::shared::serde_util;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

/// One element of the `GET /api/v1/trades/` array.
#[derive(Deserialize, Debug, Clone)]
pub struct TradeResponse {
    pub id: i64,
    pub price: Decimal,
    pub quantity: Decimal,
    #[serde(with = "serde_util::timestamp")]
    pub executed_at: DateTime<Utc>,
    #[serde(default)]
    pub buyer_order_id: Option<i64>,
    #[serde(default)]
    pub seller_order_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
}
