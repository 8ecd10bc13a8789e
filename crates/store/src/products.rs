//! Catalog product queries.
//!
//! Stock is intentionally not adjustable here: all stock movements go
//! through the engine's ledger under row locks. The only stock write this
//! module offers is the initial quantity at insert and an explicit restock
//! via [`ProductPatch`], both admin operations outside the order workflow.

use common::{Money, ProductId};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::Result;
use crate::rows::{ProductRow, row_to_product};

/// A new catalog product.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub title: String,
    pub price: Money,
    pub stock_quantity: i64,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub publisher_id: Option<Uuid>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Filters for the product listing. Unset fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub publisher_id: Option<Uuid>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub title: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Fields recognized by a partial product update.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub publisher_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock_quantity: Option<i64>,
    pub image_url: Option<String>,
}

impl ProductPatch {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.author_id.is_none()
            && self.publisher_id.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock_quantity.is_none()
            && self.image_url.is_none()
    }
}

/// Inserts a new product and returns its id.
pub async fn insert(conn: &mut PgConnection, product: &NewProduct) -> Result<ProductId> {
    let id = ProductId::new();
    sqlx::query(
        r#"
        INSERT INTO products (id, category_id, author_id, publisher_id, title,
                              description, price_cents, stock_quantity, image_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(id.as_uuid())
    .bind(product.category_id)
    .bind(product.author_id)
    .bind(product.publisher_id)
    .bind(&product.title)
    .bind(&product.description)
    .bind(product.price.cents())
    .bind(product.stock_quantity)
    .bind(&product.image_url)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// Fetches a product by id.
pub async fn get(conn: &mut PgConnection, id: ProductId) -> Result<Option<ProductRow>> {
    let row = sqlx::query("SELECT * FROM products WHERE id = $1")
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;

    row.map(row_to_product).transpose()
}

/// Lists products matching the filter.
pub async fn list(conn: &mut PgConnection, filter: ProductFilter) -> Result<Vec<ProductRow>> {
    let mut sql = String::from("SELECT * FROM products WHERE 1=1");
    let mut param_count = 0;

    // Build dynamic query
    if filter.category_id.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND category_id = ${param_count}"));
    }
    if filter.author_id.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND author_id = ${param_count}"));
    }
    if filter.publisher_id.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND publisher_id = ${param_count}"));
    }
    if filter.min_price.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND price_cents >= ${param_count}"));
    }
    if filter.max_price.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND price_cents <= ${param_count}"));
    }
    if filter.title.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND title ILIKE ${param_count}"));
    }

    sql.push_str(" ORDER BY title ASC");

    param_count += 1;
    sql.push_str(&format!(" LIMIT ${param_count}"));
    param_count += 1;
    sql.push_str(&format!(" OFFSET ${param_count}"));

    let mut query = sqlx::query(&sql);
    if let Some(category_id) = filter.category_id {
        query = query.bind(category_id);
    }
    if let Some(author_id) = filter.author_id {
        query = query.bind(author_id);
    }
    if let Some(publisher_id) = filter.publisher_id {
        query = query.bind(publisher_id);
    }
    if let Some(min_price) = filter.min_price {
        query = query.bind(min_price.cents());
    }
    if let Some(max_price) = filter.max_price {
        query = query.bind(max_price.cents());
    }
    if let Some(ref title) = filter.title {
        query = query.bind(format!("%{title}%"));
    }
    query = query.bind(filter.limit.unwrap_or(100));
    query = query.bind(filter.offset.unwrap_or(0));

    let rows = query.fetch_all(&mut *conn).await?;
    rows.into_iter().map(row_to_product).collect()
}

/// Applies a partial update to a product. Returns the number of rows
/// affected (0 when the product does not exist or the patch is empty).
pub async fn update(conn: &mut PgConnection, id: ProductId, patch: &ProductPatch) -> Result<u64> {
    if patch.is_empty() {
        return Ok(0);
    }

    let mut sql = String::from("UPDATE products SET");
    let mut assignments = Vec::new();
    let mut param_count = 0;

    if patch.category_id.is_some() {
        param_count += 1;
        assignments.push(format!(" category_id = ${param_count}"));
    }
    if patch.author_id.is_some() {
        param_count += 1;
        assignments.push(format!(" author_id = ${param_count}"));
    }
    if patch.publisher_id.is_some() {
        param_count += 1;
        assignments.push(format!(" publisher_id = ${param_count}"));
    }
    if patch.title.is_some() {
        param_count += 1;
        assignments.push(format!(" title = ${param_count}"));
    }
    if patch.description.is_some() {
        param_count += 1;
        assignments.push(format!(" description = ${param_count}"));
    }
    if patch.price.is_some() {
        param_count += 1;
        assignments.push(format!(" price_cents = ${param_count}"));
    }
    if patch.stock_quantity.is_some() {
        param_count += 1;
        assignments.push(format!(" stock_quantity = ${param_count}"));
    }
    if patch.image_url.is_some() {
        param_count += 1;
        assignments.push(format!(" image_url = ${param_count}"));
    }

    sql.push_str(&assignments.join(","));
    param_count += 1;
    sql.push_str(&format!(" WHERE id = ${param_count}"));

    let mut query = sqlx::query(&sql);
    if let Some(category_id) = patch.category_id {
        query = query.bind(category_id);
    }
    if let Some(author_id) = patch.author_id {
        query = query.bind(author_id);
    }
    if let Some(publisher_id) = patch.publisher_id {
        query = query.bind(publisher_id);
    }
    if let Some(ref title) = patch.title {
        query = query.bind(title);
    }
    if let Some(ref description) = patch.description {
        query = query.bind(description);
    }
    if let Some(price) = patch.price {
        query = query.bind(price.cents());
    }
    if let Some(stock_quantity) = patch.stock_quantity {
        query = query.bind(stock_quantity);
    }
    if let Some(ref image_url) = patch.image_url {
        query = query.bind(image_url);
    }
    query = query.bind(id.as_uuid());

    let result = query.execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch_is_detected() {
        assert!(ProductPatch::default().is_empty());
        assert!(
            !ProductPatch {
                price: Some(Money::from_cents(100)),
                ..Default::default()
            }
            .is_empty()
        );
        assert!(
            !ProductPatch {
                author_id: Some(Uuid::new_v4()),
                ..Default::default()
            }
            .is_empty()
        );
    }
}
