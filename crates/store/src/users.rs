//! User account queries.

use common::{Role, UserId};
use sqlx::PgConnection;

use crate::rows::{UserRow, row_to_user};
use crate::{Result, StoreError};

/// Fields recognized by a partial user update. `None` fields are left
/// untouched; recognized fields are applied as one `UPDATE` statement.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub fullname: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

impl UserPatch {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.fullname.is_none() && self.address.is_none() && self.phone_number.is_none()
    }
}

/// Inserts a new user and returns its id. The caller supplies an already
/// hashed password.
pub async fn insert(
    conn: &mut PgConnection,
    fullname: &str,
    email: &str,
    password_hash: &str,
    address: Option<&str>,
    phone_number: Option<&str>,
    role: Role,
) -> Result<UserId> {
    let id = UserId::new();
    sqlx::query(
        r#"
        INSERT INTO users (id, fullname, email, password_hash, address, phone_number, role)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(id.as_uuid())
    .bind(fullname)
    .bind(email)
    .bind(password_hash)
    .bind(address)
    .bind(phone_number)
    .bind(role.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// Fetches a user by id.
pub async fn get(conn: &mut PgConnection, id: UserId) -> Result<Option<UserRow>> {
    let row = sqlx::query("SELECT * FROM users WHERE id = $1")
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;

    row.map(row_to_user).transpose()
}

/// Fetches a user by email.
pub async fn get_by_email(conn: &mut PgConnection, email: &str) -> Result<Option<UserRow>> {
    let row = sqlx::query("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(row_to_user).transpose()
}

/// Applies a partial update to a user profile. Returns the number of rows
/// affected (0 when the user does not exist or the patch is empty).
pub async fn update(conn: &mut PgConnection, id: UserId, patch: &UserPatch) -> Result<u64> {
    if patch.is_empty() {
        return Ok(0);
    }

    let mut sql = String::from("UPDATE users SET");
    let mut assignments = Vec::new();
    let mut param_count = 0;

    if patch.fullname.is_some() {
        param_count += 1;
        assignments.push(format!(" fullname = ${param_count}"));
    }
    if patch.address.is_some() {
        param_count += 1;
        assignments.push(format!(" address = ${param_count}"));
    }
    if patch.phone_number.is_some() {
        param_count += 1;
        assignments.push(format!(" phone_number = ${param_count}"));
    }

    sql.push_str(&assignments.join(","));
    param_count += 1;
    sql.push_str(&format!(" WHERE id = ${param_count}"));

    let mut query = sqlx::query(&sql);
    if let Some(ref fullname) = patch.fullname {
        query = query.bind(fullname);
    }
    if let Some(ref address) = patch.address {
        query = query.bind(address);
    }
    if let Some(ref phone_number) = patch.phone_number {
        query = query.bind(phone_number);
    }
    query = query.bind(id.as_uuid());

    let result = query
        .execute(&mut *conn)
        .await
        .map_err(StoreError::Database)?;
    Ok(result.rows_affected())
}
