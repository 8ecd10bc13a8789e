//! Item diff planner.
//!
//! Reconciles a submitted item list against an order's existing line items
//! and produces the changes to apply. Pure logic: the plan is computed
//! before any product row is locked, and its changes come out in ascending
//! product-id order, which is the lock acquisition order the engine uses to
//! avoid deadlock cycles between concurrent orders sharing products.

use std::collections::BTreeMap;

use common::{OrderItemId, ProductId};
use store::OrderItemRow;
use uuid::Uuid;

use crate::error::{EngineError, Result};

/// One product+quantity entry of a submitted item list.
#[derive(Debug, Clone, Copy)]
pub struct RequestedItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A single planned change to an order's item set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemChange {
    /// Product not previously in the order; insert a line item snapshotting
    /// the product's current price and deduct the full quantity.
    Add { product_id: ProductId, quantity: i64 },

    /// Stored quantity differs from the requested one; deduct or restore
    /// the delta and update the line item. The snapshotted purchase price
    /// is left alone.
    Adjust {
        item_id: OrderItemId,
        product_id: ProductId,
        old_quantity: i64,
        new_quantity: i64,
    },

    /// Previously present but absent from (or zeroed in) the request;
    /// restore the full quantity and delete the line item.
    Remove {
        item_id: OrderItemId,
        product_id: ProductId,
        quantity: i64,
    },
}

impl ItemChange {
    /// The product this change locks and adjusts.
    pub fn product_id(&self) -> ProductId {
        match self {
            ItemChange::Add { product_id, .. }
            | ItemChange::Adjust { product_id, .. }
            | ItemChange::Remove { product_id, .. } => *product_id,
        }
    }

    /// Signed stock delta this change applies (negative = deduct).
    pub fn stock_delta(&self) -> i64 {
        match self {
            ItemChange::Add { quantity, .. } => -quantity,
            ItemChange::Adjust {
                old_quantity,
                new_quantity,
                ..
            } => old_quantity - new_quantity,
            ItemChange::Remove { quantity, .. } => *quantity,
        }
    }
}

/// Classifies every existing/requested product into exactly one change.
///
/// Unchanged quantities produce no change (their stock is never touched).
/// A requested quantity of zero or less counts as removal; if the product
/// was not in the order to begin with, it is a no-op. Duplicate product ids
/// in the request are rejected.
pub fn plan(existing: &[OrderItemRow], requested: &[RequestedItem]) -> Result<Vec<ItemChange>> {
    let mut wanted: BTreeMap<Uuid, i64> = BTreeMap::new();
    for item in requested {
        if wanted.insert(item.product_id.as_uuid(), item.quantity).is_some() {
            return Err(EngineError::Validation(format!(
                "duplicate product {} in item list",
                item.product_id
            )));
        }
    }

    let current: BTreeMap<Uuid, &OrderItemRow> = existing
        .iter()
        .map(|item| (item.product_id.as_uuid(), item))
        .collect();

    let mut changes = Vec::new();

    // BTreeMap iteration keeps the plan in ascending product-id order.
    for (&product_uuid, &item) in &current {
        let product_id = ProductId::from_uuid(product_uuid);
        match wanted.get(&product_uuid) {
            Some(&quantity) if quantity > 0 => {
                if quantity != item.quantity {
                    changes.push(ItemChange::Adjust {
                        item_id: item.id,
                        product_id,
                        old_quantity: item.quantity,
                        new_quantity: quantity,
                    });
                }
            }
            _ => {
                changes.push(ItemChange::Remove {
                    item_id: item.id,
                    product_id,
                    quantity: item.quantity,
                });
            }
        }
    }

    for (&product_uuid, &quantity) in &wanted {
        if quantity > 0 && !current.contains_key(&product_uuid) {
            changes.push(ItemChange::Add {
                product_id: ProductId::from_uuid(product_uuid),
                quantity,
            });
        }
    }

    changes.sort_by_key(|change| change.product_id().as_uuid());
    Ok(changes)
}
