//! Wire types for the order book feed.

use crate::shared::serde_util;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One pushed feed frame: a full `{bids, asks}` snapshot.
///
/// `timestamp` is not part of the base protocol. When a server includes it, it is
/// used for staleness ordering instead of the receipt time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderBookPayload {
    pub bids: Vec<WireLevel>,
    pub asks: Vec<WireLevel>,
    #[serde(default, with = "serde_util::timestamp_opt", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A single aggregated price level as sent by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}
