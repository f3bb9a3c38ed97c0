//! Operational endpoints, kept off the public `/api` surface.
//!
//! - POST /internal/sweep - Run one expiry sweep pass right now
//!
//! The background sweeper already runs on its own cadence; this hook lets an
//! external scheduler or a runbook force a pass without waiting for the next
//! tick. Deploy it behind the network boundary, not on the public listener.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

/// Result of one forced sweep pass.
#[derive(Debug, Serialize)]
pub struct SweepResponse {
    /// Stale orders moved to `Failed` and returned to inventory
    pub reaped: usize,
    /// Payment window the pass enforced, in seconds
    pub ttl_secs: u64,
}

/// Run one expiry sweep pass.
///
/// Fails every unpaid order older than the configured payment window and
/// returns its tickets to the pool. Orders mid-transition are skipped and
/// picked up by a later pass.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/internal/sweep
/// # {"reaped":3,"ttl_secs":900}
/// ```
pub async fn run_sweep(State(state): State<AppState>) -> Json<SweepResponse> {
    let reaped = state.boxoffice.sweep_expired(state.orders.payment_ttl());
    if reaped > 0 {
        tracing::info!(reaped, "Forced sweep pass reclaimed orders");
    }
    Json(SweepResponse {
        reaped,
        ttl_secs: state.orders.payment_ttl_secs,
    })
}
