//! Trade domain: executed trade records and history.

#[cfg(feature = "http")]
pub mod client;
mod convert;
pub mod wire;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A trade execution record. Read-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trade {
    pub id: i64,
    pub price: Decimal,
    pub quantity: Decimal,
    pub executed_at: DateTime<Utc>,
    pub buyer_order_id: Option<i64>,
    pub seller_order_id: Option<i64>,
    pub user_id: Option<i64>,
}

impl Trade {
    /// Price times quantity.
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }
}
