//! Payment provider callback endpoints.
//!
//! The webhook surface a payment provider calls after the buyer finishes
//! (or abandons) checkout:
//! - POST /api/payments/:session/confirm - Mark the session's order paid
//! - POST /api/payments/:session/fail - Mark the session's order failed
//!
//! # Callback Contract
//!
//! Providers retry webhooks, so both endpoints are idempotent: replaying a
//! confirm against an already-paid order (or a fail against an already-failed
//! one) returns 200 with the unchanged order rather than an error. A confirm
//! that arrives after the order was cancelled or swept is a 409; the charge
//! must be reversed on the provider side.

use axum::{
    extract::{Path, State},
    Json,
};
use boxoffice_core::PaymentSessionId;

use crate::api::orders::OrderView;
use crate::error::ApiError;
use crate::state::AppState;

/// Confirm payment for a session.
///
/// Moves the session's order from `Created` to `Paid` and queues the ticket
/// delivery email. The held tickets stay deducted from inventory.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/payments/ps_3f6d2c9a.../confirm
/// ```
///
/// Response:
/// ```json
/// {
///   "order_id": "660e8400-e29b-41d4-a716-446655440001",
///   "status": "Paid",
///   ...
/// }
/// ```
///
/// # Errors
///
/// 404 for an unknown session, 409 if the order already failed or was
/// refunded.
pub async fn confirm_payment(
    Path(session): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<OrderView>, ApiError> {
    let session = PaymentSessionId::from_string(session);
    let order = state.boxoffice.confirm_payment(&session).await?;
    Ok(Json(OrderView::from(order)))
}

/// Report a failed or abandoned payment for a session.
///
/// Moves the session's order to `Failed` and returns its tickets to the
/// pool, where the next buyer can take them immediately.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/payments/ps_3f6d2c9a.../fail
/// ```
///
/// # Errors
///
/// 404 for an unknown session, 409 if the order was already paid or
/// refunded.
pub async fn fail_payment(
    Path(session): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<OrderView>, ApiError> {
    let session = PaymentSessionId::from_string(session);
    let order = state.boxoffice.fail_payment(&session)?;
    Ok(Json(OrderView::from(order)))
}
