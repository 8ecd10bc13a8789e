//! API error types with HTTP response mapping.
//!
//! Engine errors surface to clients as distinct, stable `code` strings so a
//! UI can tell "sold out" apart from "not your order", and a lock-wait
//! expiry apart from either (it is retryable).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use engine::EngineError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or invalid bearer credential.
    Unauthorized(String),
    /// Authenticated but not allowed.
    Forbidden(String),
    /// Conflicting state, e.g. an already-registered email.
    Conflict(String),
    /// Order workflow error.
    Engine(EngineError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadRequest(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Engine(err) => {
                let status = engine_status(&err);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!(error = %err, "internal engine error");
                }
                (status, err.code(), err.to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg)
            }
        };

        let body = serde_json::json!({ "error": message, "code": code });
        (status, axum::Json(body)).into_response()
    }
}

fn engine_status(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::Forbidden => StatusCode::FORBIDDEN,
        EngineError::InvalidState { .. }
        | EngineError::InvalidTransition { .. }
        | EngineError::OutOfStock { .. } => StatusCode::CONFLICT,
        EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::LockTimeout => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::UnknownStatus(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::Engine(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        // Route through the engine taxonomy so lock timeouts keep their
        // retryable code even on the glue paths.
        ApiError::Engine(EngineError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use common::ProductId;

    use super::*;

    #[test]
    fn engine_errors_map_to_distinct_statuses() {
        assert_eq!(
            engine_status(&EngineError::NotFound {
                entity: "order",
                id: "x".to_string()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(engine_status(&EngineError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            engine_status(&EngineError::OutOfStock {
                product_id: ProductId::new(),
                requested: 2,
                available: 1
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            engine_status(&EngineError::Validation("bad".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            engine_status(&EngineError::LockTimeout),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
