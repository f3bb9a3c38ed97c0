//! Business metrics for the box office engine.
//!
//! This module provides Prometheus metrics for tracking business operations:
//! - Orders (placed, paid, failed, refunded)
//! - Inventory movements (tickets reserved and released)
//! - Revenue and refunds
//! - Reconciliation sweeps and rejected transitions
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `boxoffice_orders_total{status}` - Total orders by lifecycle outcome
//! - `boxoffice_tickets_reserved_total` - Tickets debited from the ledger
//! - `boxoffice_tickets_released_total` - Tickets credited back to the ledger
//! - `boxoffice_order_revenue_cents_total` - Revenue from paid orders in cents
//! - `boxoffice_refunds_cents_total` - Refunds issued in cents
//! - `boxoffice_insufficient_inventory_total` - Placements rejected for lack of stock
//! - `boxoffice_sweeper_reaped_total` - Stale orders reclaimed by the sweeper
//! - `boxoffice_rejected_transitions_total{from,to}` - Lifecycle edges refused
//!
//! ## Gauges
//! - `boxoffice_active_orders` - Orders currently awaiting payment
//!
//! ## Histograms
//! - `boxoffice_order_placement_duration_seconds` - Time to place an order

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Initialize and register all business metrics descriptions.
///
/// This should be called once at application startup, before any metrics are recorded.
pub fn register_business_metrics() {
    // Order metrics
    describe_counter!(
        "boxoffice_orders_total",
        "Total number of orders by lifecycle outcome (placed, paid, failed, refunded)"
    );
    describe_gauge!(
        "boxoffice_active_orders",
        "Current number of orders awaiting payment"
    );
    describe_histogram!(
        "boxoffice_order_placement_duration_seconds",
        "Time taken to validate, price, and reserve an order"
    );

    // Inventory metrics
    describe_counter!(
        "boxoffice_tickets_reserved_total",
        "Total tickets debited from the inventory ledger"
    );
    describe_counter!(
        "boxoffice_tickets_released_total",
        "Total tickets credited back to the inventory ledger"
    );
    describe_counter!(
        "boxoffice_insufficient_inventory_total",
        "Order placements rejected because inventory could not cover a line"
    );

    // Revenue metrics
    describe_counter!(
        "boxoffice_order_revenue_cents_total",
        "Total revenue from paid orders in cents"
    );
    describe_counter!(
        "boxoffice_refunds_cents_total",
        "Total refunds issued in cents"
    );

    // Lifecycle hygiene metrics
    describe_counter!(
        "boxoffice_sweeper_reaped_total",
        "Stale unpaid orders reclaimed by the reconciliation sweeper"
    );
    describe_counter!(
        "boxoffice_rejected_transitions_total",
        "Lifecycle transitions refused because the edge is not in the DAG"
    );

    tracing::info!("Business metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record a successfully placed order.
///
/// # Arguments
///
/// * `tickets` - Number of tickets reserved across all lines
/// * `duration_secs` - Placement time in seconds
pub fn record_order_placed(tickets: u32, duration_secs: f64) {
    metrics::counter!("boxoffice_orders_total", "status" => "placed").increment(1);
    metrics::counter!("boxoffice_tickets_reserved_total").increment(u64::from(tickets));
    metrics::gauge!("boxoffice_active_orders").increment(1.0);
    metrics::histogram!("boxoffice_order_placement_duration_seconds").record(duration_secs);
    tracing::debug!(tickets, duration_secs, "Recorded order_placed metric");
}

/// Record a placement rejected for lack of inventory.
pub fn record_insufficient_inventory() {
    metrics::counter!("boxoffice_insufficient_inventory_total").increment(1);
    tracing::debug!("Recorded insufficient_inventory metric");
}

/// Record an order confirmed as paid.
///
/// # Arguments
///
/// * `amount_cents` - Order total in cents
pub fn record_order_paid(amount_cents: u64) {
    metrics::counter!("boxoffice_orders_total", "status" => "paid").increment(1);
    metrics::counter!("boxoffice_order_revenue_cents_total").increment(amount_cents);
    metrics::gauge!("boxoffice_active_orders").decrement(1.0);
    tracing::debug!(amount_cents, "Recorded order_paid metric");
}

/// Record an order moved to failed and its inventory returned.
///
/// # Arguments
///
/// * `trigger` - What failed it ("payment_callback", "cancellation", "expiry")
/// * `tickets` - Number of tickets released back
pub fn record_order_failed(trigger: &'static str, tickets: u32) {
    metrics::counter!("boxoffice_orders_total", "status" => "failed", "trigger" => trigger)
        .increment(1);
    metrics::counter!("boxoffice_tickets_released_total").increment(u64::from(tickets));
    metrics::gauge!("boxoffice_active_orders").decrement(1.0);
    tracing::debug!(trigger, tickets, "Recorded order_failed metric");
}

/// Record a paid order refunded and its inventory returned.
///
/// # Arguments
///
/// * `amount_cents` - Refunded amount in cents
/// * `tickets` - Number of tickets released back
pub fn record_order_refunded(amount_cents: u64, tickets: u32) {
    metrics::counter!("boxoffice_orders_total", "status" => "refunded").increment(1);
    metrics::counter!("boxoffice_refunds_cents_total").increment(amount_cents);
    metrics::counter!("boxoffice_tickets_released_total").increment(u64::from(tickets));
    tracing::debug!(amount_cents, tickets, "Recorded order_refunded metric");
}

/// Record one reconciliation sweep pass.
///
/// # Arguments
///
/// * `reaped` - Number of stale orders the pass reclaimed
pub fn record_sweep(reaped: u64) {
    metrics::counter!("boxoffice_sweeper_reaped_total").increment(reaped);
    tracing::debug!(reaped, "Recorded sweep metric");
}

/// Record a lifecycle transition refused because the edge is not in the DAG.
///
/// # Arguments
///
/// * `from` - Status the order was in
/// * `to` - Status the caller asked for
pub fn record_rejected_transition(from: &'static str, to: &'static str) {
    metrics::counter!("boxoffice_rejected_transitions_total", "from" => from, "to" => to)
        .increment(1);
    tracing::debug!(from, to, "Recorded rejected_transition metric");
}
