//! PostgreSQL persistence layer.
//!
//! This crate owns the connection pool, the embedded schema migration, and
//! the parameterized-query glue around users, categories, products, and the
//! raw order/line-item rows. It deliberately contains no business rules:
//! stock movements and order lifecycle decisions live in the `engine` crate,
//! which drives these row-level helpers inside its own transactions.

pub mod authors;
pub mod categories;
pub mod error;
pub mod orders;
pub mod products;
pub mod publishers;
pub mod rows;
pub mod stats;
pub mod users;

pub use error::{Result, StoreError};
pub use rows::{
    AuthorRow, CategoryRow, OrderItemRow, OrderRow, ProductRow, PublisherRow, UserRow,
};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Connects a pool to the given database URL.
pub async fn connect(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Runs the embedded database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}
