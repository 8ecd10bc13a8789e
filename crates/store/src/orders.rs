//! Raw order and line-item row access.
//!
//! These helpers are the write surface the engine drives from inside its
//! transactions. They never decide anything about stock or lifecycle; they
//! only move rows.

use common::{Money, OrderId, OrderItemId, ProductId, UserId};
use sqlx::PgConnection;

use crate::Result;
use crate::rows::{OrderItemRow, OrderRow, row_to_order, row_to_order_item};

/// Inserts a new order row and returns its id.
#[allow(clippy::too_many_arguments)]
pub async fn insert(
    conn: &mut PgConnection,
    user_id: UserId,
    status: &str,
    total_amount: Money,
    shipping_address: &str,
    shipping_phone: Option<&str>,
    payment_method: &str,
) -> Result<OrderId> {
    let id = OrderId::new();
    sqlx::query(
        r#"
        INSERT INTO orders (id, user_id, status, total_amount_cents,
                            shipping_address, shipping_phone, payment_method)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(id.as_uuid())
    .bind(user_id.as_uuid())
    .bind(status)
    .bind(total_amount.cents())
    .bind(shipping_address)
    .bind(shipping_phone)
    .bind(payment_method)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// Fetches an order by id.
pub async fn get(conn: &mut PgConnection, id: OrderId) -> Result<Option<OrderRow>> {
    let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;

    row.map(row_to_order).transpose()
}

/// Fetches an order by id under a row-level exclusive lock, held for the
/// duration of the enclosing transaction. Every order mutation starts here
/// so concurrent mutations of the same order serialize.
pub async fn get_for_update(conn: &mut PgConnection, id: OrderId) -> Result<Option<OrderRow>> {
    let row = sqlx::query("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;

    row.map(row_to_order).transpose()
}

/// Lists a user's orders, newest first, excluding the given status.
pub async fn list_for_user_excluding(
    conn: &mut PgConnection,
    user_id: UserId,
    excluded_status: &str,
) -> Result<Vec<OrderRow>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM orders
        WHERE user_id = $1 AND status != $2
        ORDER BY order_date DESC
        "#,
    )
    .bind(user_id.as_uuid())
    .bind(excluded_status)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(row_to_order).collect()
}

/// Updates an order's status.
pub async fn set_status(conn: &mut PgConnection, id: OrderId, status: &str) -> Result<u64> {
    let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id.as_uuid())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Persists a recomputed order total.
pub async fn set_total(conn: &mut PgConnection, id: OrderId, total: Money) -> Result<u64> {
    let result = sqlx::query("UPDATE orders SET total_amount_cents = $1 WHERE id = $2")
        .bind(total.cents())
        .bind(id.as_uuid())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Inserts a line item snapshotting its purchase price, returns its id.
pub async fn insert_item(
    conn: &mut PgConnection,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i64,
    price_at_purchase: Money,
) -> Result<OrderItemId> {
    let id = OrderItemId::new();
    sqlx::query(
        r#"
        INSERT INTO order_items (id, order_id, product_id, quantity, price_at_purchase_cents)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id.as_uuid())
    .bind(order_id.as_uuid())
    .bind(product_id.as_uuid())
    .bind(quantity)
    .bind(price_at_purchase.cents())
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// Fetches an order's line items, in ascending product-id order to match
/// the engine's lock ordering.
pub async fn items_for_order(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Vec<OrderItemRow>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM order_items
        WHERE order_id = $1
        ORDER BY product_id ASC
        "#,
    )
    .bind(order_id.as_uuid())
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(row_to_order_item).collect()
}

/// Recomputes an order's total from its current line items.
pub async fn total_for_order(conn: &mut PgConnection, order_id: OrderId) -> Result<Money> {
    let cents: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(quantity * price_at_purchase_cents), 0)::BIGINT
        FROM order_items
        WHERE order_id = $1
        "#,
    )
    .bind(order_id.as_uuid())
    .fetch_one(&mut *conn)
    .await?;

    Ok(Money::from_cents(cents))
}

/// Updates a line item's quantity. The snapshotted purchase price is never
/// touched.
pub async fn set_item_quantity(
    conn: &mut PgConnection,
    item_id: OrderItemId,
    quantity: i64,
) -> Result<u64> {
    let result = sqlx::query("UPDATE order_items SET quantity = $1 WHERE id = $2")
        .bind(quantity)
        .bind(item_id.as_uuid())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Deletes a line item.
pub async fn delete_item(conn: &mut PgConnection, item_id: OrderItemId) -> Result<u64> {
    let result = sqlx::query("DELETE FROM order_items WHERE id = $1")
        .bind(item_id.as_uuid())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
