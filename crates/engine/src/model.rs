//! Order read model returned by engine operations.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, UserId};
use serde::Serialize;
use store::{OrderItemRow, OrderRow};

use crate::error::Result;
use crate::status::OrderStatus;

/// An order with its line items, as seen by callers of the engine.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub shipping_address: String,
    pub shipping_phone: Option<String>,
    pub payment_method: String,
    pub order_date: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// One line item of an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub product_id: common::ProductId,
    pub quantity: i64,
    pub price_at_purchase: Money,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            product_id: row.product_id,
            quantity: row.quantity,
            price_at_purchase: row.price_at_purchase,
        }
    }
}

impl Order {
    /// Assembles an order from its row and item rows, parsing the stored
    /// status.
    pub(crate) fn assemble(row: OrderRow, items: Vec<OrderItemRow>) -> Result<Self> {
        Ok(Order {
            id: row.id,
            user_id: row.user_id,
            status: OrderStatus::parse(&row.status)?,
            total_amount: row.total_amount,
            shipping_address: row.shipping_address,
            shipping_phone: row.shipping_phone,
            payment_method: row.payment_method,
            order_date: row.order_date,
            items: items.into_iter().map(OrderItem::from).collect(),
        })
    }
}
