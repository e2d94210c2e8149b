//! Conversions from wire types to domain types for trades.

use super::wire::TradeResponse;
use super::Trade;

impl From<TradeResponse> for Trade {
    fn from(t: TradeResponse) -> Self {
        Self {
            id: t.id,
            price: t.price,
            quantity: t.quantity,
            executed_at: t.executed_at,
            buyer_order_id: t.buyer_order_id,
            seller_order_id: t.seller_order_id,
            user_id: t.user_id,
        }
    }
}
