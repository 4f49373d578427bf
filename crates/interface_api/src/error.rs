//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use core_kernel::MoneyError;
use domain_settlement::{SettlementError, StoreError};

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone())
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
            ApiError::Database(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", msg.clone())
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<MoneyError> for ApiError {
    fn from(err: MoneyError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Settlement(domain) => domain.into(),
            StoreError::Backend(msg) => ApiError::Database(msg),
        }
    }
}

impl From<SettlementError> for ApiError {
    fn from(err: SettlementError) -> Self {
        match &err {
            // Duplicate settlement attempts are conflicts, not validation
            // failures; idempotent clients key off the 409.
            SettlementError::AlreadyPaid => ApiError::Conflict(err.to_string()),
            SettlementError::InvalidTransition { .. } => ApiError::Validation(err.to_string()),
            e if e.is_integrity_violation() => ApiError::Internal(err.to_string()),
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_paid_maps_to_conflict() {
        let err: ApiError = StoreError::Settlement(SettlementError::AlreadyPaid).into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn invalid_transition_maps_to_validation() {
        let err: ApiError = SettlementError::InvalidTransition {
            from: "failed".to_string(),
            to: "refunded".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn integrity_violations_map_to_internal() {
        use rust_decimal_macros::dec;
        let err: ApiError = SettlementError::InvariantDrift {
            cached: dec!(10.00),
            recomputed: dec!(20.00),
        }
        .into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
