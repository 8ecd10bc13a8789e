//! Stock ledger: the authoritative per-product stock counter.
//!
//! All stock reads and writes made by the order workflow go through here,
//! inside the caller's transaction. [`lock_and_get`] takes a row-level
//! exclusive lock (`SELECT ... FOR UPDATE`) held until commit or rollback;
//! [`adjust`] must only be called after a successful `lock_and_get` on the
//! same product within the same transaction. This is what prevents lost
//! updates between concurrent orders touching the same product.

use common::{Money, ProductId};
use sqlx::{PgConnection, Row};

use crate::error::{EngineError, Result};

/// Snapshot of a product row taken under its row lock.
#[derive(Debug, Clone, Copy)]
pub struct LockedProduct {
    pub product_id: ProductId,
    pub stock_quantity: i64,
    /// Current catalog price, used to snapshot `price_at_purchase` when a
    /// new line item is added during mutation.
    pub price: Money,
}

/// Locks a product row and returns its stock level and current price.
///
/// The lock is held for the duration of the enclosing transaction.
pub async fn lock_and_get(conn: &mut PgConnection, product_id: ProductId) -> Result<LockedProduct> {
    let row = sqlx::query("SELECT stock_quantity, price_cents FROM products WHERE id = $1 FOR UPDATE")
        .bind(product_id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| EngineError::NotFound {
            entity: "product",
            id: product_id.to_string(),
        })?;

    Ok(LockedProduct {
        product_id,
        stock_quantity: row.try_get("stock_quantity")?,
        price: Money::from_cents(row.try_get("price_cents")?),
    })
}

/// Applies a signed stock delta (negative = deduct, positive = restore).
///
/// The update is guarded so the stored quantity can never go negative: a
/// deduction that would undershoot zero affects no rows and fails with
/// `OutOfStock`. A missing product fails with `NotFound`.
pub async fn adjust(conn: &mut PgConnection, product_id: ProductId, delta: i64) -> Result<()> {
    if delta == 0 {
        return Ok(());
    }

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity + $2
        WHERE id = $1 AND stock_quantity + $2 >= 0
        "#,
    )
    .bind(product_id.as_uuid())
    .bind(delta)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    // Zero rows: either the product vanished or the guard rejected the
    // deduction. The caller holds the row lock, so re-reading is stable.
    let available: Option<i64> =
        sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = $1")
            .bind(product_id.as_uuid())
            .fetch_optional(&mut *conn)
            .await?;

    match available {
        Some(available) => Err(EngineError::OutOfStock {
            product_id,
            requested: -delta,
            available,
        }),
        None => Err(EngineError::NotFound {
            entity: "product",
            id: product_id.to_string(),
        }),
    }
}
