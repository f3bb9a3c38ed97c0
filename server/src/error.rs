//! Error types for web handlers.
//!
//! Bridges [`OrderError`] and friends into HTTP responses with a stable JSON
//! shape (`code` + `message`) via Axum's `IntoResponse`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use boxoffice_core::OrderError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// Wraps domain errors and converts them into HTTP responses. Handlers return
/// `Result<_, ApiError>` and let `?` do the mapping.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl ApiError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), "CONFLICT".to_string())
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            message.into(),
            "VALIDATION_ERROR".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Log internal errors
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Convert `anyhow::Error` to `ApiError`.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

/// Map domain errors to HTTP semantics.
///
/// - sold out or rejected transitions are conflicts (409)
/// - malformed orders are validation errors (422)
/// - missing entities are not found (404)
/// - ledger corruption is an internal error (500), logged with the detail
impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InsufficientInventory { .. } | OrderError::InvalidTransition { .. } => {
                Self::conflict(err.to_string())
            }
            OrderError::EmptyOrder
            | OrderError::InvalidQuantity { .. }
            | OrderError::VariantInactive(_) => Self::validation(err.to_string()),
            OrderError::UnknownVariant(id) => Self::not_found("Variant", id),
            OrderError::UnknownOrder(id) => Self::not_found("Order", id),
            OrderError::UnknownPaymentSession(id) => Self::not_found("Payment session", id),
            OrderError::Ledger(_) => {
                Self::internal("Inventory accounting failed").with_source(err.into())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use boxoffice_core::{OrderId, OrderStatus, VariantId};

    #[test]
    fn display_includes_code() {
        let err = ApiError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn sold_out_maps_to_conflict() {
        let err: ApiError = OrderError::InsufficientInventory {
            variant: VariantId::new(),
            requested: 4,
            available: 1,
        }
        .into();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[test]
    fn rejected_transition_maps_to_conflict() {
        let err: ApiError = OrderError::InvalidTransition {
            order: OrderId::new(),
            from: OrderStatus::Failed,
            to: OrderStatus::Paid,
        }
        .into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "CONFLICT");
    }

    #[test]
    fn unknown_order_maps_to_not_found() {
        let id = OrderId::new();
        let err: ApiError = OrderError::UnknownOrder(id).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(err.message.contains(&id.to_string()));
    }

    #[test]
    fn empty_order_maps_to_validation() {
        let err: ApiError = OrderError::EmptyOrder.into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn ledger_failure_maps_to_internal() {
        let err: ApiError =
            OrderError::Ledger(boxoffice_core::LedgerError::InvalidQuantity).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
