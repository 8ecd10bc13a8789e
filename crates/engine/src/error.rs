//! Engine error taxonomy.
//!
//! Every error raised inside a transactional operation aborts that
//! transaction before it surfaces; no operation leaves a half-applied state.

use common::ProductId;
use store::StoreError;
use thiserror::Error;

use crate::status::OrderStatus;

/// Errors that can occur during order workflow operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The principal is neither the owner of the order nor an admin.
    #[error("Not authorized to access this order")]
    Forbidden,

    /// The order's lifecycle state does not allow this operation.
    #[error("Order status '{status}' does not allow this operation")]
    InvalidState { status: OrderStatus },

    /// A disallowed lifecycle transition was requested.
    #[error("Cannot transition order from '{from}' to '{to}'")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// A deduction would drive a product's stock below zero.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    OutOfStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// The request itself is malformed (non-positive quantity, duplicate or
    /// empty item list).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A row lock could not be acquired within the transaction's
    /// `lock_timeout`. Retryable; distinct from a stock-out.
    #[error("Timed out waiting for a row lock; retry the request")]
    LockTimeout,

    /// An order row carries a status string the state machine does not know.
    #[error("Unknown order status in store: {0}")]
    UnknownStatus(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl EngineError {
    /// Stable machine-readable code for client error handling.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::NotFound { .. } => "not_found",
            EngineError::Forbidden => "forbidden",
            EngineError::InvalidState { .. } => "invalid_state",
            EngineError::InvalidTransition { .. } => "invalid_transition",
            EngineError::OutOfStock { .. } => "out_of_stock",
            EngineError::Validation(_) => "validation",
            EngineError::LockTimeout => "lock_timeout",
            EngineError::UnknownStatus(_) | EngineError::Database(_) => "internal",
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.code().as_deref() == Some("55P03")
        {
            return EngineError::LockTimeout;
        }
        EngineError::Database(e)
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        if e.is_lock_timeout() {
            return EngineError::LockTimeout;
        }
        match e {
            StoreError::Database(db) => EngineError::Database(db),
            StoreError::Migration(m) => EngineError::Database(sqlx::Error::Migrate(Box::new(m))),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            EngineError::NotFound {
                entity: "order",
                id: "x".to_string()
            }
            .code(),
            "not_found"
        );
        assert_eq!(EngineError::Forbidden.code(), "forbidden");
        assert_eq!(EngineError::LockTimeout.code(), "lock_timeout");
        assert_eq!(
            EngineError::Validation("bad".to_string()).code(),
            "validation"
        );
    }
}
