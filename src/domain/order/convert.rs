//! Conversions between order wire types and domain types.

use super::wire::{OrderRequest, OrderResponse, PlacedOrderResponse};
use super::OrderStatus;
use super::{NewOrder, OrderAck};

impl From<&NewOrder> for OrderRequest {
    fn from(order: &NewOrder) -> Self {
        OrderRequest {
            side: order.side(),
            price: order.price(),
            quantity: order.quantity(),
        }
    }
}

impl From<OrderResponse> for OrderAck {
    fn from(resp: OrderResponse) -> Self {
        OrderAck {
            id: resp.id,
            user_id: resp.user_id,
            side: resp.side,
            price: resp.price,
            quantity: resp.quantity,
            status: resp.status,
            filled_quantity: resp.filled_quantity,
            created_at: Some(resp.created_at),
            updated_at: resp.updated_at,
        }
    }
}

impl PlacedOrderResponse {
    /// Build the ack, falling back to `submitted` for omitted fields. A missing
    /// status is reported as `Unknown`.
    pub(crate) fn into_ack(self, submitted: &NewOrder) -> OrderAck {
        OrderAck {
            id: self.id,
            user_id: self.user_id,
            side: self.side.unwrap_or(submitted.side()),
            price: self.price.unwrap_or(submitted.price()),
            quantity: self.quantity.unwrap_or(submitted.quantity()),
            status: self.status.unwrap_or(OrderStatus::Unknown),
            filled_quantity: self.filled_quantity,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
