//! Conversion: OrderBookPayload → OrderBookSnapshot (TryFrom + validation).

use super::wire::{self, WireLevel};
use super::{BookValidationError, OrderBookSnapshot, PriceLevel};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

impl TryFrom<(wire::OrderBookPayload, DateTime<Utc>)> for OrderBookSnapshot {
    type Error = BookValidationError;

    fn try_from(value: (wire::OrderBookPayload, DateTime<Utc>)) -> Result<Self, Self::Error> {
        let (payload, received_at) = value;
        let mut errors: Vec<BookValidationError> = Vec::new();

        let bids = convert_side("bids", payload.bids, &mut errors);
        let asks = convert_side("asks", payload.asks, &mut errors);

        match errors.len() {
            0 => Ok(OrderBookSnapshot {
                bids,
                asks,
                received_at: payload.timestamp.unwrap_or(received_at),
            }),
            1 => Err(errors.remove(0)),
            _ => Err(BookValidationError::Multiple(errors)),
        }
    }
}

fn convert_side(
    side: &'static str,
    levels: Vec<WireLevel>,
    errors: &mut Vec<BookValidationError>,
) -> Vec<PriceLevel> {
    let mut out = Vec::with_capacity(levels.len());
    for (index, level) in levels.into_iter().enumerate() {
        if level.price < Decimal::ZERO {
            errors.push(BookValidationError::NegativePrice { side, index });
            continue;
        }
        if level.quantity < Decimal::ZERO {
            errors.push(BookValidationError::NegativeQuantity { side, index });
            continue;
        }
        out.push(PriceLevel {
            price: level.price,
            quantity: level.quantity,
        });
    }
    out
}
