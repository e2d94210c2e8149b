//! Orderbook domain: price levels, full-replacement snapshots, reconciliation.

mod convert;
pub mod state;
pub mod wire;

pub use state::{ApplyOutcome, BookView, SnapshotReconciler};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single aggregated price level. Both fields are non-negative.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

/// A complete order book state. Each snapshot fully supersedes the previous one.
///
/// Levels keep the order the server sent them in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderBookSnapshot {
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub received_at: DateTime<Utc>,
}

impl OrderBookSnapshot {
    /// Decode a raw feed frame. `received_at` is used when the frame carries no
    /// timestamp of its own.
    pub fn decode(text: &str, received_at: DateTime<Utc>) -> Result<Self, BookValidationError> {
        let payload: wire::OrderBookPayload = serde_json::from_str(text)
            .map_err(|e| BookValidationError::Malformed(e.to_string()))?;
        Self::try_from((payload, received_at))
    }

    /// Highest bid price.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.iter().map(|l| l.price).max()
    }

    /// Lowest ask price.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.iter().map(|l| l.price).min()
    }

    /// Mid price (average of best bid and best ask).
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::from(2)),
            _ => None,
        }
    }

    /// Spread between best ask and best bid.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Zero bids and zero asks. A valid state, distinct from "no snapshot yet".
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

// ─── Validation ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum BookValidationError {
    Malformed(String),
    NegativePrice { side: &'static str, index: usize },
    NegativeQuantity { side: &'static str, index: usize },
    Multiple(Vec<BookValidationError>),
}

impl fmt::Display for BookValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookValidationError::Malformed(m) => write!(f, "Malformed payload: {m}"),
            BookValidationError::NegativePrice { side, index } => {
                write!(f, "Negative price at {side}[{index}]")
            }
            BookValidationError::NegativeQuantity { side, index } => {
                write!(f, "Negative quantity at {side}[{index}]")
            }
            BookValidationError::Multiple(errors) => {
                writeln!(f, "Snapshot validation errors:")?;
                for err in errors {
                    writeln!(f, "  - {}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for BookValidationError {}
