//! Author reference-data queries.

use chrono::NaiveDate;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::Result;
use crate::rows::{AuthorRow, row_to_author};

/// Inserts a new author and returns its id.
pub async fn insert(
    conn: &mut PgConnection,
    name: &str,
    year_of_birth: Option<NaiveDate>,
    year_of_death: Option<NaiveDate>,
    hometown: Option<&str>,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO authors (id, name, year_of_birth, year_of_death, hometown)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(year_of_birth)
    .bind(year_of_death)
    .bind(hometown)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// Fetches an author by id.
pub async fn get(conn: &mut PgConnection, id: Uuid) -> Result<Option<AuthorRow>> {
    let row = sqlx::query("SELECT * FROM authors WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(row_to_author).transpose()
}

/// Lists all authors by name.
pub async fn list(conn: &mut PgConnection) -> Result<Vec<AuthorRow>> {
    let rows = sqlx::query("SELECT * FROM authors ORDER BY name ASC")
        .fetch_all(&mut *conn)
        .await?;

    rows.into_iter().map(row_to_author).collect()
}
