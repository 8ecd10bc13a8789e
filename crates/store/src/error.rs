use thiserror::Error;

/// Errors that can occur when interacting with the relational store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Returns true if the underlying database error is a lock-wait timeout
    /// (SQLSTATE 55P03, `lock_not_available`).
    ///
    /// Contended row locks expire against the transaction's `lock_timeout`
    /// and must surface to callers as retryable, never as a stock-out.
    pub fn is_lock_timeout(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(db_err)) => {
                db_err.code().as_deref() == Some("55P03")
            }
            _ => false,
        }
    }

    /// Returns true if the underlying database error is a unique constraint
    /// violation (SQLSTATE 23505).
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(db_err)) => {
                db_err.code().as_deref() == Some("23505")
            }
            _ => false,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
