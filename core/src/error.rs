//! Error taxonomy for the box office engine.
//!
//! Errors are split per component: the catalog rejects malformed registrations,
//! the ledger rejects impossible inventory movements, and the order layer wraps
//! both behind [`OrderError`], the type every external operation returns.

use thiserror::Error;

use crate::types::{OrderId, OrderStatus, PaymentSessionId, PerformanceId, TicketTypeId, VariantId};

/// Errors raised while assembling the catalog
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Referenced venue does not exist
    #[error("Unknown venue referenced by event")]
    UnknownVenue,

    /// Referenced event does not exist
    #[error("Unknown event referenced by performance")]
    UnknownEvent,

    /// Referenced performance does not exist
    #[error("Unknown performance referenced by ticket type")]
    UnknownPerformance,

    /// Referenced ticket type does not exist
    #[error("Unknown ticket type referenced by variant: {0}")]
    UnknownTicketType(TicketTypeId),

    /// A ticket type with this name already exists for the performance
    #[error("Duplicate ticket type name {name:?} for performance {performance}")]
    DuplicateTicketTypeName {
        /// Performance the collision happened on
        performance: PerformanceId,
        /// The colliding name
        name: String,
    },

    /// A variant of this kind already exists for the ticket type
    #[error("Duplicate {kind} variant for ticket type {ticket_type}")]
    DuplicateVariantKind {
        /// Ticket type the collision happened on
        ticket_type: TicketTypeId,
        /// The colliding kind
        kind: crate::types::VariantKind,
    },

    /// An entity was registered twice under the same id
    #[error("Duplicate catalog id")]
    DuplicateId,

    /// Discount percentage must be at most 100
    #[error("Discount of {0}% is out of range for variant")]
    DiscountOutOfRange(u32),
}

/// Errors raised by the inventory ledger
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Quantity must be at least 1
    #[error("Quantity must be greater than zero")]
    InvalidQuantity,

    /// The ticket type has no ledger account
    #[error("No ledger account for ticket type {0}")]
    UnknownTicketType(TicketTypeId),

    /// The ticket type already has a ledger account
    #[error("Ledger account already exists for ticket type {0}")]
    AlreadyRegistered(TicketTypeId),

    /// Not enough tickets left to satisfy the debit
    #[error("Insufficient inventory: requested {requested}, available {available}")]
    InsufficientInventory {
        /// How many tickets the debit asked for
        requested: u32,
        /// How many were actually available
        available: u32,
    },

    /// A credit would push availability past the capacity ceiling.
    ///
    /// This is a fatal invariant violation: it means tickets were about to be
    /// created out of thin air. The operation is aborted, never clamped.
    #[error("Ledger corruption on ticket type {ticket_type}: {detail}")]
    Corruption {
        /// Account the violation was detected on
        ticket_type: TicketTypeId,
        /// What went wrong
        detail: String,
    },
}

/// Errors returned by the order-facing operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// An order needs at least one line
    #[error("Order must contain at least one line")]
    EmptyOrder,

    /// A line asked for zero (or an impossible number of) tickets
    #[error("Invalid quantity {quantity} for variant {variant}")]
    InvalidQuantity {
        /// Variant on the offending line
        variant: VariantId,
        /// The rejected quantity
        quantity: u32,
    },

    /// The requested variant is not in the catalog
    #[error("Unknown variant {0}")]
    UnknownVariant(VariantId),

    /// The requested variant exists but is not on sale
    #[error("Variant {0} is not active")]
    VariantInactive(VariantId),

    /// Not enough inventory to cover one of the lines
    #[error("Insufficient inventory for variant {variant}: requested {requested}, available {available}")]
    InsufficientInventory {
        /// Variant on the line that could not be covered
        variant: VariantId,
        /// How many tickets the line asked for
        requested: u32,
        /// How many were actually available
        available: u32,
    },

    /// No order with this id
    #[error("Unknown order {0}")]
    UnknownOrder(OrderId),

    /// No order is associated with this payment session
    #[error("Unknown payment session {0}")]
    UnknownPaymentSession(PaymentSessionId),

    /// The requested lifecycle edge does not exist in the DAG
    #[error("Invalid transition {from} -> {to} for order {order}")]
    InvalidTransition {
        /// Order the transition was attempted on
        order: OrderId,
        /// Status the order was in
        from: OrderStatus,
        /// Status the caller asked for
        to: OrderStatus,
    },

    /// The ledger refused an inventory movement
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
