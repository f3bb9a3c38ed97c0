//! Router configuration for the box office server.
//!
//! Builds the complete Axum router with all endpoints.

use crate::api::{admin, availability, orders, payments};
use crate::health::{health_check, readiness_check};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Build the complete Axum router.
///
/// Configures all routes including:
/// - Health checks
/// - Order workflow endpoints
/// - Payment provider callbacks
/// - Availability queries
/// - Internal operational hooks
///
/// # Arguments
///
/// - `state`: Application state to share with handlers
///
/// # Returns
///
/// Configured Axum router ready to serve requests.
pub fn build_router(state: AppState) -> Router {
    // Buyer- and provider-facing routes
    let api_routes = Router::new()
        // Order workflow
        .route("/orders", post(orders::place_order))
        .route("/orders/:id", get(orders::get_order))
        .route("/orders/:id/transitions", get(orders::get_order_transitions))
        .route("/orders/:id/cancel", post(orders::cancel_order))
        .route("/orders/:id/refund", post(orders::refund_order))
        // Payment provider callbacks
        .route("/payments/:session/confirm", post(payments::confirm_payment))
        .route("/payments/:session/fail", post(payments::fail_payment))
        // Availability queries (ledger read side)
        .route(
            "/ticket-types/:id/availability",
            get(availability::get_availability),
        );

    // Hooks for schedulers and runbooks, not exposed publicly
    let internal_routes = Router::new().route("/sweep", post(admin::run_sweep));

    Router::new()
        // Health checks
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // API routes under /api prefix
        .nest("/api", api_routes)
        .nest("/internal", internal_routes)
        .with_state(state)
}
