//! Domain types for the box office engine.
//!
//! This module contains the shared value objects and the order entity: typed
//! identifiers, cents-based money, ticket variant kinds, and the order state
//! machine vocabulary. Catalog entities live in [`crate::catalog`] and the
//! ledger's hold token in [`crate::ledger`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::ledger::ReservationToken;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a venue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VenueId(Uuid);

impl VenueId {
    /// Creates a new random `VenueId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `VenueId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VenueId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a performance (a single dated occurrence of an event)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerformanceId(Uuid);

impl PerformanceId {
    /// Creates a new random `PerformanceId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `PerformanceId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PerformanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PerformanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a ticket type (the capacity-bearing sales unit)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketTypeId(Uuid);

impl TicketTypeId {
    /// Creates a new random `TicketTypeId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `TicketTypeId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TicketTypeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a ticket variant (the purchasable pricing of a type)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantId(Uuid);

impl VariantId {
    /// Creates a new random `VariantId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `VariantId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VariantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random `OrderId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `OrderId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an inventory hold
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HoldId(Uuid);

impl HoldId {
    /// Creates a new random `HoldId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `HoldId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for HoldId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HoldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque payment session handle issued at order placement.
///
/// The payment provider echoes this token back in its callbacks, so it is the
/// key that correlates provider notifications with orders.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentSessionId(String);

impl PaymentSessionId {
    /// Issues a new random payment session token
    #[must_use]
    pub fn new() -> Self {
        Self(format!("ps_{}", Uuid::new_v4().simple()))
    }

    /// Wraps an existing token, e.g. one echoed back by the provider
    #[must_use]
    pub const fn from_string(token: String) -> Self {
        Self(token)
    }

    /// Returns the token as a string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PaymentSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount in whole currency units (rounded down)
    #[must_use]
    pub const fn units(&self) -> u64 {
        self.0 / 100
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Adds two money amounts
    ///
    /// # Panics
    ///
    /// Panics if the addition would overflow.
    /// Use `checked_add` for non-panicking addition.
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn add(self, other: Self) -> Self {
        match self.checked_add(other) {
            Some(result) => result,
            None => panic!("Money::add overflow"),
        }
    }

    /// Subtracts two money amounts (returns None if result would be negative)
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        if self.0 >= other.0 {
            Some(Self(self.0 - other.0))
        } else {
            None
        }
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Multiplies money by a quantity
    ///
    /// # Panics
    ///
    /// Panics if the multiplication would overflow.
    /// Use `checked_multiply` for non-panicking multiplication.
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn multiply(self, quantity: u32) -> Self {
        match self.checked_multiply(quantity) {
            Some(result) => result,
            None => panic!("Money::multiply overflow"),
        }
    }

    /// Applies a percentage discount with overflow checking
    #[must_use]
    pub const fn checked_apply_discount(self, percent: u32) -> Option<Self> {
        let discount = match self.0.checked_mul(percent as u64) {
            Some(product) => product / 100,
            None => return None,
        };

        // Discount should never exceed the original amount
        if discount > self.0 {
            return None;
        }

        Some(Self(self.0 - discount))
    }

    /// Applies a percentage discount
    ///
    /// # Panics
    ///
    /// Panics if the calculation would overflow or the percentage exceeds 100.
    /// Use `checked_apply_discount` for non-panicking discount.
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn apply_discount(self, percent: u32) -> Self {
        match self.checked_apply_discount(percent) {
            Some(result) => result,
            None => panic!("Money::apply_discount overflow"),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.units(), self.0 % 100)
    }
}

// ============================================================================
// Ticket Variant Kinds
// ============================================================================

/// Audience category a ticket variant is sold under.
///
/// The kind determines the statutory discount that applies and whether the
/// variant is usually capped (e.g. accessible seating).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariantKind {
    /// Full-price admission
    Full,
    /// Half-price admission (students and similar entitlements)
    Half,
    /// Elderly discount admission
    Elderly,
    /// Accessible admission for people with disabilities
    Pcd,
}

impl VariantKind {
    /// Returns the kind as a display string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "Full",
            Self::Half => "Half",
            Self::Elderly => "Elderly",
            Self::Pcd => "PCD",
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Order State Machine Vocabulary
// ============================================================================

/// Order lifecycle status.
///
/// Transitions form a strict DAG with no cycles and no re-entry:
///
/// ```text
/// Created ──▶ Paid ──▶ Refunded
///    │
///    └──▶ Failed
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Placed, inventory held, awaiting payment
    Created,
    /// Payment confirmed, tickets owned
    Paid,
    /// Payment failed, cancelled, or expired; inventory returned
    Failed,
    /// Paid order refunded; inventory returned
    Refunded,
}

impl OrderStatus {
    /// Checks whether the edge `self -> next` exists in the lifecycle DAG
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Paid | Self::Failed) | (Self::Paid, Self::Refunded)
        )
    }

    /// Checks whether the status admits no further transitions
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Refunded)
    }

    /// Returns the status as a display string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Paid => "Paid",
            Self::Failed => "Failed",
            Self::Refunded => "Refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What caused a lifecycle transition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionTrigger {
    /// Payment provider callback (confirm or fail)
    PaymentCallback,
    /// Buyer abandoned the order before paying
    Cancellation,
    /// Reconciliation sweep reclaimed a stale order
    Expiry,
    /// Operator-initiated refund of a paid order
    Refund,
}

impl TransitionTrigger {
    /// Returns the trigger as a display string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentCallback => "payment_callback",
            Self::Cancellation => "cancellation",
            Self::Expiry => "expiry",
            Self::Refund => "refund",
        }
    }
}

impl fmt::Display for TransitionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Orders
// ============================================================================

/// One requested line of a purchase: a variant and how many of it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Variant being purchased
    pub variant_id: VariantId,
    /// Number of tickets requested (must be at least 1)
    pub quantity: u32,
}

impl OrderLine {
    /// Creates a new `OrderLine`
    #[must_use]
    pub const fn new(variant_id: VariantId, quantity: u32) -> Self {
        Self {
            variant_id,
            quantity,
        }
    }
}

/// A settled line within a placed order.
///
/// The unit price is snapshotted at placement; later catalog edits never
/// change what the buyer owes. The reservation token links the line to the
/// ledger hold backing it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Ticket type the purchased variant belongs to
    pub ticket_type_id: TicketTypeId,
    /// Purchased variant
    pub variant_id: VariantId,
    /// Variant kind at time of purchase
    pub kind: VariantKind,
    /// Number of tickets on this line
    pub quantity: u32,
    /// Price per ticket at placement (discount applied, fee included)
    pub unit_price: Money,
    /// Ledger hold backing this line
    pub hold: ReservationToken,
}

impl OrderItem {
    /// Returns the line total (`unit_price` times quantity)
    ///
    /// # Panics
    ///
    /// Panics if the multiplication would overflow.
    #[must_use]
    pub const fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Order entity: a buyer's purchase and its lifecycle state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier
    pub id: OrderId,
    /// Buyer's email, the authoritative order-to-user linkage
    pub user_email: String,
    /// Current lifecycle status
    pub status: OrderStatus,
    /// Payment session issued at placement
    pub payment_session: Option<PaymentSessionId>,
    /// Total owed (sum of line totals, snapshotted at placement)
    pub total: Money,
    /// Settled purchase lines
    pub items: Vec<OrderItem>,
    /// When the order was placed
    pub created_at: DateTime<Utc>,
    /// When the order last changed status
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the total number of tickets across all lines
    #[must_use]
    pub fn ticket_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Audit record of one lifecycle transition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Order that transitioned
    pub order_id: OrderId,
    /// Status before the transition
    pub from: OrderStatus,
    /// Status after the transition
    pub to: OrderStatus,
    /// What caused the transition
    pub trigger: TransitionTrigger,
    /// When the transition was applied
    pub at: DateTime<Utc>,
}
