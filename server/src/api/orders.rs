//! Order management API endpoints.
//!
//! Provides the buyer-facing order workflow:
//! - POST /api/orders - Place a multi-line order (all-or-nothing)
//! - GET /api/orders/:id - Get order details
//! - GET /api/orders/:id/transitions - Get the order's audit trail
//! - POST /api/orders/:id/cancel - Cancel an unpaid order
//! - POST /api/orders/:id/refund - Refund a paid order
//!
//! # Order Flow
//!
//! ```text
//! 1. Place: every line is reserved atomically, a payment session is issued
//! 2. Pay: the payment provider calls back on /api/payments/:session/confirm
//! 3. Refund: paid orders can be refunded, returning tickets to the pool
//! 4. Abandon: cancel explicitly, or let the sweeper expire the order
//! ```

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use boxoffice_core::{Order, OrderId, OrderItem, OrderLine, TransitionRecord, VariantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// One line of an order being placed.
#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    /// Variant to purchase
    pub variant_id: Uuid,
    /// Number of tickets (must be at least 1)
    pub quantity: u32,
}

/// Request to place a new order.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    /// Buyer's email address
    pub user_email: String,
    /// Lines to purchase; reserved atomically as one unit
    pub lines: Vec<OrderLineRequest>,
}

/// One settled line of an order.
#[derive(Debug, Serialize)]
pub struct OrderItemView {
    /// Ticket type the line draws inventory from
    pub ticket_type_id: Uuid,
    /// Purchased variant
    pub variant_id: Uuid,
    /// Variant kind at time of purchase
    pub kind: String,
    /// Number of tickets
    pub quantity: u32,
    /// Price per ticket in cents, snapshotted at placement
    pub unit_price_cents: u64,
    /// Line total in cents
    pub line_total_cents: u64,
}

/// Order details response.
#[derive(Debug, Serialize)]
pub struct OrderView {
    /// Order ID
    pub order_id: Uuid,
    /// Buyer's email
    pub user_email: String,
    /// Current lifecycle status (Created, Paid, Failed, Refunded)
    pub status: String,
    /// Payment session to confirm or fail against
    pub payment_session: Option<String>,
    /// Total owed in cents
    pub total_cents: u64,
    /// Settled lines
    pub items: Vec<OrderItemView>,
    /// When the order was placed
    pub created_at: DateTime<Utc>,
    /// When the order last changed status
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            order_id: *order.id.as_uuid(),
            user_email: order.user_email,
            status: order.status.as_str().to_string(),
            payment_session: order
                .payment_session
                .map(|session| session.as_str().to_string()),
            total_cents: order.total.cents(),
            items: order.items.into_iter().map(OrderItemView::from).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

impl From<OrderItem> for OrderItemView {
    fn from(item: OrderItem) -> Self {
        let line_total = item.line_total();
        Self {
            ticket_type_id: *item.ticket_type_id.as_uuid(),
            variant_id: *item.variant_id.as_uuid(),
            kind: item.kind.as_str().to_string(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
            line_total_cents: line_total.cents(),
        }
    }
}

/// One recorded lifecycle transition.
#[derive(Debug, Serialize)]
pub struct TransitionView {
    /// Status before the transition
    pub from: String,
    /// Status after the transition
    pub to: String,
    /// What caused the transition
    pub trigger: String,
    /// When the transition was applied
    pub at: DateTime<Utc>,
}

impl From<TransitionRecord> for TransitionView {
    fn from(record: TransitionRecord) -> Self {
        Self {
            from: record.from.as_str().to_string(),
            to: record.to.as_str().to_string(),
            trigger: record.trigger.as_str().to_string(),
            at: record.at,
        }
    }
}

/// Audit trail response.
#[derive(Debug, Serialize)]
pub struct TransitionListResponse {
    /// Accepted transitions, oldest first
    pub transitions: Vec<TransitionView>,
    /// Total count
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// Place a new order.
///
/// Reserves every line atomically: if any line cannot be covered, nothing is
/// reserved and the response names the exact shortfall. On success a payment
/// session is issued and the clock starts on the payment window.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/orders \
///   -H "Content-Type: application/json" \
///   -d '{
///     "user_email": "clara@example.com",
///     "lines": [
///       {"variant_id": "550e8400-e29b-41d4-a716-446655440000", "quantity": 2}
///     ]
///   }'
/// ```
///
/// Response:
/// ```json
/// {
///   "order_id": "660e8400-e29b-41d4-a716-446655440001",
///   "status": "Created",
///   "payment_session": "ps_3f6d2c...",
///   "total_cents": 22000,
///   ...
/// }
/// ```
pub async fn place_order(
    State(state): State<AppState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>), ApiError> {
    if request.user_email.trim().is_empty() {
        return Err(ApiError::bad_request("user_email must not be empty"));
    }
    if request.lines.len() > state.orders.max_lines_per_order {
        return Err(ApiError::bad_request(format!(
            "Cannot order more than {} lines at once",
            state.orders.max_lines_per_order
        )));
    }

    let lines: Vec<OrderLine> = request
        .lines
        .iter()
        .map(|line| OrderLine::new(VariantId::from_uuid(line.variant_id), line.quantity))
        .collect();

    let order = state.boxoffice.place_order(&request.user_email, &lines)?;
    Ok((StatusCode::CREATED, Json(OrderView::from(order))))
}

/// Get order details by ID.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/api/orders/660e8400-e29b-41d4-a716-446655440001
/// ```
pub async fn get_order(
    Path(order_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<OrderView>, ApiError> {
    let order = state.boxoffice.order(OrderId::from_uuid(order_id))?;
    Ok(Json(OrderView::from(order)))
}

/// Get the audit trail of an order.
///
/// Returns every accepted transition, oldest first. Rejected attempts are
/// never recorded here.
pub async fn get_order_transitions(
    Path(order_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<TransitionListResponse>, ApiError> {
    let id = OrderId::from_uuid(order_id);
    // 404 for unknown ids, empty list for known orders with no transitions
    state.boxoffice.order(id)?;
    let transitions: Vec<TransitionView> = state
        .boxoffice
        .transitions_for(id)
        .into_iter()
        .map(TransitionView::from)
        .collect();
    let total = transitions.len();
    Ok(Json(TransitionListResponse { transitions, total }))
}

/// Cancel an unpaid order.
///
/// Releases the order's tickets back to the pool. Only `Created` orders can
/// be cancelled; anything else is a 409.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/orders/660e8400-.../cancel
/// ```
pub async fn cancel_order(
    Path(order_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<OrderView>, ApiError> {
    let order = state.boxoffice.cancel_order(OrderId::from_uuid(order_id))?;
    Ok(Json(OrderView::from(order)))
}

/// Refund a paid order.
///
/// Returns the order's tickets to the pool and queues a refund receipt.
/// Only `Paid` orders can be refunded; anything else is a 409.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/orders/660e8400-.../refund
/// ```
pub async fn refund_order(
    Path(order_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<OrderView>, ApiError> {
    let order = state.boxoffice.refund(OrderId::from_uuid(order_id)).await?;
    Ok(Json(OrderView::from(order)))
}
