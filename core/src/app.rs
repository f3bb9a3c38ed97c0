//! The `Boxoffice` facade: one composition root over catalog, ledger,
//! reservations, and lifecycle.
//!
//! Servers and tools construct a [`Boxoffice`] from a validated catalog and
//! talk to it exclusively; the components behind it stay wired together
//! consistently (one ledger account per ticket type, one order store, one
//! clock). The builder swaps the clock and notifier for tests.

use chrono::Duration;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::clock::{Clock, SystemClock};
use crate::error::{LedgerError, OrderError};
use crate::ledger::{AvailabilitySnapshot, InventoryLedger};
use crate::lifecycle::OrderLifecycle;
use crate::notifier::{LogNotifier, Notifier};
use crate::reservation::ReservationEngine;
use crate::store::OrderStore;
use crate::types::{Order, OrderId, OrderLine, PaymentSessionId, TicketTypeId, TransitionRecord};

/// The assembled box office engine
pub struct Boxoffice {
    catalog: Arc<Catalog>,
    ledger: Arc<InventoryLedger>,
    store: Arc<OrderStore>,
    reservations: ReservationEngine,
    lifecycle: Arc<OrderLifecycle>,
}

/// Configures the clock and notifier before assembly
pub struct BoxofficeBuilder {
    catalog: Catalog,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl BoxofficeBuilder {
    /// Swaps the clock (tests drive a [`crate::clock::ManualClock`])
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Swaps the notifier
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Assembles the engine, opening one ledger account per ticket type at
    /// full capacity.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AlreadyRegistered`] if the catalog somehow
    /// carries two ticket types with the same id; a catalog built through
    /// [`Catalog::from_def`] cannot.
    pub fn build(self) -> Result<Boxoffice, LedgerError> {
        let ledger = InventoryLedger::new();
        for ticket_type in self.catalog.ticket_types() {
            ledger.register(ticket_type, self.catalog.variants_of(ticket_type.id))?;
        }

        let catalog = Arc::new(self.catalog);
        let ledger = Arc::new(ledger);
        let store = Arc::new(OrderStore::new());
        let reservations = ReservationEngine::new(
            Arc::clone(&catalog),
            Arc::clone(&ledger),
            Arc::clone(&store),
            Arc::clone(&self.clock),
        );
        let lifecycle = Arc::new(OrderLifecycle::new(
            Arc::clone(&store),
            Arc::clone(&ledger),
            self.notifier,
            self.clock,
        ));

        tracing::info!(
            ticket_types = catalog.ticket_type_count(),
            "Box office assembled"
        );
        Ok(Boxoffice {
            catalog,
            ledger,
            store,
            reservations,
            lifecycle,
        })
    }
}

impl Boxoffice {
    /// Assembles an engine with the system clock and logging notifier
    ///
    /// # Errors
    ///
    /// See [`BoxofficeBuilder::build`].
    pub fn new(catalog: Catalog) -> Result<Self, LedgerError> {
        Self::builder(catalog).build()
    }

    /// Starts a builder over a validated catalog
    #[must_use]
    pub fn builder(catalog: Catalog) -> BoxofficeBuilder {
        BoxofficeBuilder {
            catalog,
            clock: Arc::new(SystemClock),
            notifier: LogNotifier::shared(),
        }
    }

    /// Places a multi-line order atomically
    ///
    /// # Errors
    ///
    /// See [`ReservationEngine::place_order`].
    pub fn place_order(&self, user_email: &str, lines: &[OrderLine]) -> Result<Order, OrderError> {
        self.reservations.place_order(user_email, lines)
    }

    /// Confirms payment for the order behind a session (idempotent)
    ///
    /// # Errors
    ///
    /// See [`OrderLifecycle::confirm_payment`].
    pub async fn confirm_payment(&self, session: &PaymentSessionId) -> Result<Order, OrderError> {
        self.lifecycle.confirm_payment(session).await
    }

    /// Fails the order behind a session and returns its inventory
    ///
    /// # Errors
    ///
    /// See [`OrderLifecycle::fail_payment`].
    pub fn fail_payment(&self, session: &PaymentSessionId) -> Result<Order, OrderError> {
        self.lifecycle.fail_payment(session)
    }

    /// Cancels an unpaid order and returns its inventory
    ///
    /// # Errors
    ///
    /// See [`OrderLifecycle::cancel_order`].
    pub fn cancel_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.lifecycle.cancel_order(order_id)
    }

    /// Refunds a paid order and returns its inventory
    ///
    /// # Errors
    ///
    /// See [`OrderLifecycle::refund`].
    pub async fn refund(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.lifecycle.refund(order_id).await
    }

    /// Returns a point-in-time snapshot of an order
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::UnknownOrder`] for an unknown id.
    pub fn order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.lifecycle.order(order_id)
    }

    /// Reclaims unpaid orders older than `ttl`, returning how many
    pub fn sweep_expired(&self, ttl: Duration) -> usize {
        self.lifecycle.sweep_expired(ttl)
    }

    /// Reads current availability for a ticket type
    #[must_use]
    pub fn availability(&self, ticket_type: TicketTypeId) -> Option<AvailabilitySnapshot> {
        self.ledger.availability(ticket_type)
    }

    /// Returns the audit trail of one order
    #[must_use]
    pub fn transitions_for(&self, order_id: OrderId) -> Vec<TransitionRecord> {
        self.store.transitions_for(order_id)
    }

    /// The catalog the engine was assembled from
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Shared handle to the lifecycle, for wiring the sweeper task
    #[must_use]
    pub fn lifecycle(&self) -> Arc<OrderLifecycle> {
        Arc::clone(&self.lifecycle)
    }

    /// Number of orders ever placed
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.store.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogDef, Event, Performance, TicketType, TicketVariant, Venue};
    use crate::clock::ManualClock;
    use crate::types::{EventId, Money, OrderStatus, PerformanceId, VariantId, VariantKind, VenueId};
    use chrono::{TimeZone, Utc};

    fn def() -> (CatalogDef, TicketTypeId, VariantId) {
        let venue = Venue {
            id: VenueId::new(),
            name: "Teatro Municipal".to_string(),
            city: "São Paulo".to_string(),
        };
        let event = Event {
            id: EventId::new(),
            venue_id: venue.id,
            name: "Hamlet".to_string(),
        };
        let performance = Performance {
            id: PerformanceId::new(),
            event_id: event.id,
            starts_at: Utc.with_ymd_and_hms(2025, 9, 12, 20, 0, 0).unwrap(),
        };
        let stalls = TicketType {
            id: TicketTypeId::new(),
            performance_id: performance.id,
            name: "Stalls".to_string(),
            price: Money::from_cents(15_000),
            initial_quantity: 8,
        };
        let full = TicketVariant {
            id: VariantId::new(),
            ticket_type_id: stalls.id,
            kind: VariantKind::Full,
            price: Money::from_cents(15_000),
            fee: Money::from_cents(1_500),
            discount_pct: None,
            cap: None,
            active: true,
        };
        let ids = (stalls.id, full.id);
        (
            CatalogDef {
                venues: vec![venue],
                events: vec![event],
                performances: vec![performance],
                ticket_types: vec![stalls],
                variants: vec![full],
            },
            ids.0,
            ids.1,
        )
    }

    #[tokio::test]
    async fn full_purchase_flow() {
        let (def, stalls, full) = def();
        let boxoffice = Boxoffice::new(Catalog::from_def(def).unwrap()).unwrap();

        let order = boxoffice
            .place_order("ana@example.com", &[OrderLine::new(full, 2)])
            .unwrap();
        assert_eq!(boxoffice.availability(stalls).unwrap().available, 6);

        let session = order.payment_session.clone().unwrap();
        let paid = boxoffice.confirm_payment(&session).await.unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
        assert_eq!(boxoffice.availability(stalls).unwrap().available, 6);

        let refunded = boxoffice.refund(order.id).await.unwrap();
        assert_eq!(refunded.status, OrderStatus::Refunded);
        assert_eq!(boxoffice.availability(stalls).unwrap().available, 8);

        assert_eq!(boxoffice.transitions_for(order.id).len(), 2);
        assert_eq!(boxoffice.order_count(), 1);
    }

    #[tokio::test]
    async fn sweep_uses_injected_clock() {
        let (def, stalls, full) = def();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
        ));
        let boxoffice = Boxoffice::builder(Catalog::from_def(def).unwrap())
            .with_clock(Arc::clone(&clock) as Arc<dyn Clock>)
            .build()
            .unwrap();

        let order = boxoffice
            .place_order("rui@example.com", &[OrderLine::new(full, 3)])
            .unwrap();
        assert_eq!(boxoffice.sweep_expired(Duration::minutes(15)), 0);

        clock.advance(Duration::minutes(16));
        assert_eq!(boxoffice.sweep_expired(Duration::minutes(15)), 1);
        assert_eq!(boxoffice.order(order.id).unwrap().status, OrderStatus::Failed);
        assert_eq!(boxoffice.availability(stalls).unwrap().available, 8);
    }
}
