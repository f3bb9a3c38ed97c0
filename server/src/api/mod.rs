//! API endpoints for the box office server.
//!
//! This module contains all HTTP API handlers organized by domain:
//! - Orders: placing, reading, cancelling, and refunding orders
//! - Payments: provider callbacks that settle payment sessions
//! - Availability: read-only inventory snapshots
//! - Admin: operational hooks kept off the public surface

pub mod admin;
pub mod availability;
pub mod orders;
pub mod payments;

pub use admin::run_sweep;
pub use availability::get_availability;
pub use orders::{cancel_order, get_order, get_order_transitions, place_order, refund_order};
pub use payments::{confirm_payment, fail_payment};
