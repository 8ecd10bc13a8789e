//! Publisher reference-data queries.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::Result;
use crate::rows::{PublisherRow, row_to_publisher};

/// Inserts a new publisher and returns its id.
pub async fn insert(
    conn: &mut PgConnection,
    name: &str,
    address: Option<&str>,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO publishers (id, name, address) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(name)
        .bind(address)
        .execute(&mut *conn)
        .await?;

    Ok(id)
}

/// Fetches a publisher by id.
pub async fn get(conn: &mut PgConnection, id: Uuid) -> Result<Option<PublisherRow>> {
    let row = sqlx::query("SELECT * FROM publishers WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(row_to_publisher).transpose()
}

/// Lists all publishers by name.
pub async fn list(conn: &mut PgConnection) -> Result<Vec<PublisherRow>> {
    let rows = sqlx::query("SELECT * FROM publishers ORDER BY name ASC")
        .fetch_all(&mut *conn)
        .await?;

    rows.into_iter().map(row_to_publisher).collect()
}
