//! Box Office Core - the reservation and order engine of an event ticketing platform
//!
//! This crate implements the backend that sells tickets without overselling
//! them: a read-mostly catalog, a linearizable inventory ledger, an atomic
//! multi-line reservation engine, and a strict order lifecycle with an audit
//! trail and a background expiry sweeper.
//!
//! # Architecture
//!
//! ```text
//!                        ┌────────────────────┐
//!                        │     Boxoffice      │  facade (app.rs)
//!                        └─────────┬──────────┘
//!              ┌─────────────┬─────┴───────┬──────────────┐
//!              ▼             ▼             ▼              ▼
//!       ┌────────────┐ ┌──────────┐ ┌───────────────┐ ┌──────────────┐
//!       │  Catalog   │ │Inventory │ │  Reservation  │ │    Order     │
//!       │ (immutable │ │  Ledger  │ │    Engine     │ │  Lifecycle   │
//!       │ reference) │ │(counters)│ │ (place_order) │ │(state machine│
//!       └────────────┘ └──────────┘ └───────────────┘ │  + sweeper)  │
//!                            ▲             │          └──────┬───────┘
//!                            │   reserve / release / credit  │
//!                            └─────────────┴─────────────────┘
//! ```
//!
//! # Key Guarantees
//!
//! ## 1. No Overselling
//!
//! Every reservation and release goes through one mutex-guarded account per
//! ticket type, so the counters are linearizable:
//!
//! ```text
//! available + sum(held) == initial     (always)
//!
//! if available < quantity {
//!     return InsufficientInventory  // reject, never queue or clamp
//! }
//! ```
//!
//! ## 2. All-or-Nothing Orders
//!
//! A multi-line order either reserves every line or reserves nothing. On the
//! first line that fails, earlier holds are rolled back and the caller gets
//! the exact shortfall.
//!
//! ## 3. Strict Lifecycle With Audit Trail
//!
//! ```text
//! Created ──confirm──▶ Paid ──refund──▶ Refunded
//!    │
//!    └──fail / cancel / expire──▶ Failed
//! ```
//!
//! Any other transition is rejected. Payment confirmation is idempotent:
//! replaying a provider callback is a no-op, not an error. Every accepted
//! transition is recorded with its trigger and timestamp.
//!
//! ## 4. Automatic Reclamation
//!
//! Unpaid orders past their payment window are swept back into inventory by
//! [`ExpirySweeper`], which skips orders that are mid-transition rather than
//! blocking on them.
//!
//! # Usage
//!
//! Build a [`Catalog`] from a [`CatalogDef`], hand it to [`Boxoffice::new`],
//! and drive the engine through the facade. Tests inject a
//! [`clock::ManualClock`] and a [`notifier::RecordingNotifier`] through
//! [`Boxoffice::builder`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod catalog;
pub mod clock;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod metrics;
pub mod notifier;
pub mod reservation;
pub mod store;
pub mod sweeper;
pub mod types;

pub use app::{Boxoffice, BoxofficeBuilder};
pub use catalog::{Catalog, CatalogDef, Event, Performance, TicketType, TicketVariant, Venue};
pub use clock::{Clock, SystemClock};
pub use error::{CatalogError, LedgerError, OrderError};
pub use ledger::{AvailabilitySnapshot, InventoryLedger, ReservationToken, VariantAvailability};
pub use lifecycle::OrderLifecycle;
pub use notifier::{LogNotifier, Notifier, NotifierError, NotifyResult};
pub use reservation::ReservationEngine;
pub use store::OrderStore;
pub use sweeper::ExpirySweeper;
pub use types::*;
