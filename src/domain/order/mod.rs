//! Order domain: outbound order requests and server acknowledgements.

#[cfg(feature = "http")]
pub mod client;
mod convert;
pub mod wire;

use crate::shared::Side;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── OrderStatus ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
    /// A status this client does not know about yet.
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::PartiallyFilled => "partially_filled",
            OrderStatus::Filled => "filled",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Unknown => "unknown",
        }
    }

    /// Still resting on the book.
    pub fn is_live(&self) -> bool {
        matches!(self, OrderStatus::Open | OrderStatus::PartiallyFilled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── NewOrder ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderValidationError {
    #[error("price must be greater than zero, got {0}")]
    NonPositivePrice(Decimal),
    #[error("quantity must be greater than zero")]
    ZeroQuantity,
}

/// A validated order ready for submission.
///
/// Fields are private so an invalid order cannot be built; use [`NewOrder::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    side: Side,
    price: Decimal,
    quantity: u64,
}

impl NewOrder {
    pub fn new(side: Side, price: Decimal, quantity: u64) -> Result<Self, OrderValidationError> {
        if price <= Decimal::ZERO {
            return Err(OrderValidationError::NonPositivePrice(price));
        }
        if quantity == 0 {
            return Err(OrderValidationError::ZeroQuantity);
        }
        Ok(Self {
            side,
            price,
            quantity,
        })
    }

    pub fn buy(price: Decimal, quantity: u64) -> Result<Self, OrderValidationError> {
        Self::new(Side::Buy, price, quantity)
    }

    pub fn sell(price: Decimal, quantity: u64) -> Result<Self, OrderValidationError> {
        Self::new(Side::Sell, price, quantity)
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    /// Price times quantity.
    pub fn notional(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

// ─── OrderAck ────────────────────────────────────────────────────────────────

/// The server's record of an order, as returned on placement or listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderAck {
    pub id: i64,
    pub user_id: Option<i64>,
    pub side: Side,
    pub price: Decimal,
    pub quantity: u64,
    pub status: OrderStatus,
    pub filled_quantity: u64,
    /// Absent when a placement ack omitted it.
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl OrderAck {
    pub fn remaining_quantity(&self) -> u64 {
        self.quantity.saturating_sub(self.filled_quantity)
    }
}
