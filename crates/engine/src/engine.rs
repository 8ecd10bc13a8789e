//! The order workflow engine.
//!
//! Every order-affecting operation (create, mutate, cancel, status update)
//! runs as one database transaction. Product row locks are acquired in
//! ascending product-id order and held until commit; dropping an uncommitted
//! transaction (error return, client disconnect) rolls everything back, so
//! no partial write is ever observable.

use std::collections::BTreeMap;

use common::{Money, OrderId, Principal, ProductId};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::diff::{self, ItemChange, RequestedItem};
use crate::error::{EngineError, Result};
use crate::ledger;
use crate::model::Order;
use crate::status::OrderStatus;

/// A new order submission.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub shipping_address: String,
    pub shipping_phone: Option<String>,
    pub payment_method: String,
    pub items: Vec<NewOrderItem>,
}

/// One requested line of a new order. `unit_price` is snapshotted as the
/// line's `price_at_purchase`.
#[derive(Debug, Clone, Copy)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

/// Order workflow engine over a PostgreSQL pool.
#[derive(Clone)]
pub struct OrderEngine {
    pool: PgPool,
    lock_timeout_ms: u64,
}

impl OrderEngine {
    /// Creates an engine with the default 5s row-lock wait budget.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout_ms: 5_000,
        }
    }

    /// Overrides the per-transaction `lock_timeout`.
    pub fn with_lock_timeout_ms(mut self, lock_timeout_ms: u64) -> Self {
        self.lock_timeout_ms = lock_timeout_ms;
        self
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        // SET LOCAL scopes the timeout to this transaction; a contended
        // product lock then fails with SQLSTATE 55P03 instead of blocking
        // the worker indefinitely.
        sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout_ms))
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    /// Creates an order with its line items, deducting stock atomically.
    ///
    /// Validation happens before any lock is taken; every product is then
    /// locked and checked, and only when all items pass are the order row,
    /// item rows, and stock deductions written.
    #[tracing::instrument(skip(self, order), fields(user_id = %principal.id))]
    pub async fn create_order(&self, principal: &Principal, order: NewOrder) -> Result<Order> {
        let (items, total) = validate_new_items(&order.items)?;

        let mut tx = self.begin().await?;

        for item in items.values() {
            let locked = ledger::lock_and_get(&mut *tx, item.product_id).await?;
            if item.quantity > locked.stock_quantity {
                return Err(EngineError::OutOfStock {
                    product_id: item.product_id,
                    requested: item.quantity,
                    available: locked.stock_quantity,
                });
            }
        }

        let order_id = store::orders::insert(
            &mut *tx,
            principal.id,
            OrderStatus::Pending.as_str(),
            total,
            &order.shipping_address,
            order.shipping_phone.as_deref(),
            &order.payment_method,
        )
        .await?;

        for item in items.values() {
            store::orders::insert_item(
                &mut *tx,
                order_id,
                item.product_id,
                item.quantity,
                item.unit_price,
            )
            .await?;
            ledger::adjust(&mut *tx, item.product_id, -item.quantity).await?;
        }

        let row = fetch_order_row(&mut *tx, order_id).await?;
        let item_rows = store::orders::items_for_order(&mut *tx, order_id).await?;
        tx.commit().await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(%order_id, total_cents = total.cents(), "order created");

        Order::assemble(row, item_rows)
    }

    /// Loads an order with its items. Fails `Forbidden` unless the
    /// principal owns it or is an admin.
    #[tracing::instrument(skip(self), fields(user_id = %principal.id))]
    pub async fn get_order(&self, principal: &Principal, order_id: OrderId) -> Result<Order> {
        let mut conn = self.pool.acquire().await?;

        let row = store::orders::get(&mut *conn, order_id)
            .await?
            .ok_or_else(|| not_found(order_id))?;
        if !principal.can_access(row.user_id) {
            return Err(EngineError::Forbidden);
        }

        let items = store::orders::items_for_order(&mut *conn, order_id).await?;
        Order::assemble(row, items)
    }

    /// Lists the principal's non-cancelled orders, newest first, with
    /// nested items.
    #[tracing::instrument(skip(self), fields(user_id = %principal.id))]
    pub async fn list_orders(&self, principal: &Principal) -> Result<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;

        let rows = store::orders::list_for_user_excluding(
            &mut *conn,
            principal.id,
            OrderStatus::Cancelled.as_str(),
        )
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = store::orders::items_for_order(&mut *conn, row.id).await?;
            orders.push(Order::assemble(row, items)?);
        }
        Ok(orders)
    }

    /// Reconciles the submitted item list against the order's current line
    /// items and applies the difference, returning the recomputed total.
    #[tracing::instrument(skip(self, requested), fields(user_id = %principal.id))]
    pub async fn update_items(
        &self,
        principal: &Principal,
        order_id: OrderId,
        requested: &[RequestedItem],
    ) -> Result<Money> {
        let mut tx = self.begin().await?;

        let row = store::orders::get_for_update(&mut *tx, order_id)
            .await?
            .ok_or_else(|| not_found(order_id))?;
        if !principal.can_access(row.user_id) {
            return Err(EngineError::Forbidden);
        }
        let status = OrderStatus::parse(&row.status)?;
        if !status.can_modify_items() {
            return Err(EngineError::InvalidState { status });
        }

        let existing = store::orders::items_for_order(&mut *tx, order_id).await?;
        let changes = diff::plan(&existing, requested)?;

        for change in &changes {
            self.apply_change(&mut *tx, order_id, change).await?;
        }

        let total = store::orders::total_for_order(&mut *tx, order_id).await?;
        store::orders::set_total(&mut *tx, order_id, total).await?;
        tx.commit().await?;

        metrics::counter!("orders_mutated_total").increment(1);
        tracing::info!(%order_id, changes = changes.len(), total_cents = total.cents(), "order items updated");

        Ok(total)
    }

    /// Cancels an order, restoring the stock of every line item.
    #[tracing::instrument(skip(self), fields(user_id = %principal.id))]
    pub async fn cancel_order(&self, principal: &Principal, order_id: OrderId) -> Result<Order> {
        let mut tx = self.begin().await?;

        let row = store::orders::get_for_update(&mut *tx, order_id)
            .await?
            .ok_or_else(|| not_found(order_id))?;
        if !principal.can_access(row.user_id) {
            return Err(EngineError::Forbidden);
        }
        let status = OrderStatus::parse(&row.status)?;
        if !status.can_cancel() {
            return Err(EngineError::InvalidState { status });
        }

        let items = restore_all_items(&mut *tx, order_id).await?;
        store::orders::set_status(&mut *tx, order_id, OrderStatus::Cancelled.as_str()).await?;

        let row = fetch_order_row(&mut *tx, order_id).await?;
        tx.commit().await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(%order_id, "order cancelled");

        Order::assemble(row, items)
    }

    /// Admin status update, enforcing forward-only lifecycle transitions.
    ///
    /// A transition to `cancelled` runs the same stock restoration as a
    /// user cancellation.
    #[tracing::instrument(skip(self), fields(user_id = %principal.id))]
    pub async fn set_status(
        &self,
        principal: &Principal,
        order_id: OrderId,
        target: OrderStatus,
    ) -> Result<Order> {
        if !principal.is_admin() {
            return Err(EngineError::Forbidden);
        }

        let mut tx = self.begin().await?;

        let row = store::orders::get_for_update(&mut *tx, order_id)
            .await?
            .ok_or_else(|| not_found(order_id))?;
        let current = OrderStatus::parse(&row.status)?;
        if !current.can_advance_to(target) {
            return Err(EngineError::InvalidTransition {
                from: current,
                to: target,
            });
        }

        let items = if target == OrderStatus::Cancelled {
            restore_all_items(&mut *tx, order_id).await?
        } else {
            store::orders::items_for_order(&mut *tx, order_id).await?
        };
        store::orders::set_status(&mut *tx, order_id, target.as_str()).await?;

        let row = fetch_order_row(&mut *tx, order_id).await?;
        tx.commit().await?;

        tracing::info!(%order_id, from = %current, to = %target, "order status updated");

        Order::assemble(row, items)
    }

    /// Applies one planned item change: lock the product, move stock, then
    /// write the line item.
    async fn apply_change(
        &self,
        conn: &mut PgConnection,
        order_id: OrderId,
        change: &ItemChange,
    ) -> Result<()> {
        let locked = ledger::lock_and_get(&mut *conn, change.product_id()).await?;

        let delta = change.stock_delta();
        if delta < 0 && -delta > locked.stock_quantity {
            return Err(EngineError::OutOfStock {
                product_id: change.product_id(),
                requested: -delta,
                available: locked.stock_quantity,
            });
        }
        ledger::adjust(&mut *conn, change.product_id(), delta).await?;

        match *change {
            ItemChange::Add {
                product_id,
                quantity,
            } => {
                // New lines snapshot the product's current price, read
                // under the same row lock that validated the stock.
                store::orders::insert_item(&mut *conn, order_id, product_id, quantity, locked.price)
                    .await?;
            }
            ItemChange::Adjust {
                item_id,
                new_quantity,
                ..
            } => {
                store::orders::set_item_quantity(&mut *conn, item_id, new_quantity).await?;
            }
            ItemChange::Remove { item_id, .. } => {
                store::orders::delete_item(&mut *conn, item_id).await?;
            }
        }
        Ok(())
    }
}

/// Restores every line item's quantity to the ledger. Items arrive in
/// ascending product-id order, matching the lock ordering used everywhere
/// else.
async fn restore_all_items(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Vec<store::OrderItemRow>> {
    let items = store::orders::items_for_order(&mut *conn, order_id).await?;
    for item in &items {
        ledger::lock_and_get(&mut *conn, item.product_id).await?;
        ledger::adjust(&mut *conn, item.product_id, item.quantity).await?;
    }
    Ok(items)
}

async fn fetch_order_row(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<store::OrderRow> {
    store::orders::get(conn, order_id)
        .await?
        .ok_or_else(|| not_found(order_id))
}

fn not_found(order_id: OrderId) -> EngineError {
    EngineError::NotFound {
        entity: "order",
        id: order_id.to_string(),
    }
}

/// Rejects empty lists, non-positive quantities, duplicate products, and
/// totals that would not fit a cent amount, all before any database work.
/// Returns items keyed (and therefore ordered) by product id, plus the
/// order total.
fn validate_new_items(items: &[NewOrderItem]) -> Result<(BTreeMap<Uuid, NewOrderItem>, Money)> {
    if items.is_empty() {
        return Err(EngineError::Validation(
            "order must contain at least one item".to_string(),
        ));
    }

    let mut by_product = BTreeMap::new();
    let mut total = Money::zero();
    for item in items {
        if item.quantity <= 0 {
            return Err(EngineError::Validation(format!(
                "quantity must be positive for product {}",
                item.product_id
            )));
        }
        if item.unit_price.is_negative() {
            return Err(EngineError::Validation(format!(
                "unit price must not be negative for product {}",
                item.product_id
            )));
        }
        // Prices arrive from the client; an unchecked sum could wrap and
        // persist a corrupt total.
        total = item
            .unit_price
            .checked_mul(item.quantity)
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| {
                EngineError::Validation(format!(
                    "order total overflows at product {}",
                    item.product_id
                ))
            })?;
        if by_product
            .insert(item.product_id.as_uuid(), *item)
            .is_some()
        {
            return Err(EngineError::Validation(format!(
                "duplicate product {} in item list",
                item.product_id
            )));
        }
    }
    Ok((by_product, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64) -> NewOrderItem {
        NewOrderItem {
            product_id: ProductId::new(),
            quantity,
            unit_price: Money::from_cents(1000),
        }
    }

    #[test]
    fn empty_item_list_is_rejected() {
        let err = validate_new_items(&[]).unwrap_err();
        assert_eq!(err.code(), "validation");
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        assert_eq!(validate_new_items(&[item(0)]).unwrap_err().code(), "validation");
        assert_eq!(validate_new_items(&[item(-3)]).unwrap_err().code(), "validation");
    }

    #[test]
    fn negative_price_is_rejected() {
        let bad = NewOrderItem {
            product_id: ProductId::new(),
            quantity: 1,
            unit_price: Money::from_cents(-1),
        };
        assert_eq!(validate_new_items(&[bad]).unwrap_err().code(), "validation");
    }

    #[test]
    fn duplicate_products_are_rejected() {
        let a = item(1);
        let b = NewOrderItem { quantity: 2, ..a };
        assert_eq!(validate_new_items(&[a, b]).unwrap_err().code(), "validation");
    }

    #[test]
    fn overflowing_totals_are_rejected() {
        let huge = NewOrderItem {
            product_id: ProductId::new(),
            quantity: 2,
            unit_price: Money::from_cents(i64::MAX),
        };
        assert_eq!(validate_new_items(&[huge]).unwrap_err().code(), "validation");

        // A sum of individually representable lines can still overflow.
        let a = NewOrderItem {
            product_id: ProductId::new(),
            quantity: 1,
            unit_price: Money::from_cents(i64::MAX),
        };
        let b = item(1);
        assert_eq!(validate_new_items(&[a, b]).unwrap_err().code(), "validation");
    }

    #[test]
    fn valid_items_come_back_ordered_by_product_id() {
        let items = [item(1), item(2), item(3)];
        let (validated, total) = validate_new_items(&items).unwrap();
        assert_eq!(validated.len(), 3);
        assert_eq!(total.cents(), 6 * 1000);
        let keys: Vec<Uuid> = validated.keys().copied().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
