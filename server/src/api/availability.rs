//! Ticket availability query endpoints.
//!
//! Read-only snapshots of the inventory ledger:
//! - GET /api/ticket-types/:id/availability - Current counters for one ticket type
//!
//! The snapshot is point-in-time. Under a rush it can be stale the moment it
//! is produced; the ledger itself remains the only authority at reservation
//! time.

use axum::{
    extract::{Path, State},
    Json,
};
use boxoffice_core::{AvailabilitySnapshot, TicketTypeId, VariantAvailability};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Remaining quota of one capped variant.
#[derive(Debug, Serialize)]
pub struct VariantAvailabilityView {
    /// The capped variant
    pub variant_id: Uuid,
    /// Its quota within the type's capacity
    pub cap: u32,
    /// How much of the quota is left
    pub available: u32,
}

/// Availability snapshot for a ticket type.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    /// Ticket type the snapshot describes
    pub ticket_type_id: Uuid,
    /// Capacity ceiling
    pub initial: u32,
    /// Tickets currently purchasable
    pub available: u32,
    /// Tickets tied up in outstanding holds
    pub held: u32,
    /// Capped variants and what is left of their quotas
    pub variants: Vec<VariantAvailabilityView>,
}

impl From<AvailabilitySnapshot> for AvailabilityResponse {
    fn from(snapshot: AvailabilitySnapshot) -> Self {
        Self {
            ticket_type_id: *snapshot.ticket_type.as_uuid(),
            initial: snapshot.initial,
            available: snapshot.available,
            held: snapshot.held,
            variants: snapshot
                .variants
                .into_iter()
                .map(VariantAvailabilityView::from)
                .collect(),
        }
    }
}

impl From<VariantAvailability> for VariantAvailabilityView {
    fn from(entry: VariantAvailability) -> Self {
        Self {
            variant_id: *entry.variant.as_uuid(),
            cap: entry.cap,
            available: entry.available,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Get current availability for a ticket type.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/api/ticket-types/550e8400-e29b-41d4-a716-446655440000/availability
/// ```
///
/// Response:
/// ```json
/// {
///   "ticket_type_id": "550e8400-e29b-41d4-a716-446655440000",
///   "initial": 500,
///   "available": 342,
///   "held": 158,
///   "variants": [
///     {"variant_id": "770e8400-...", "cap": 50, "available": 12}
///   ]
/// }
/// ```
///
/// # Errors
///
/// 404 for a ticket type the ledger has no account for.
pub async fn get_availability(
    Path(ticket_type_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let snapshot = state
        .boxoffice
        .availability(TicketTypeId::from_uuid(ticket_type_id))
        .ok_or_else(|| ApiError::not_found("Ticket type", ticket_type_id))?;
    Ok(Json(AvailabilityResponse::from(snapshot)))
}
