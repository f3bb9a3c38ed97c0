//! Reservation engine: turns a validated purchase request into a placed order.
//!
//! Placement is all-or-nothing. Lines are validated and priced against the
//! catalog, duplicate lines for the same variant are merged, and each line is
//! then debited from the ledger. If any debit fails, every hold already taken
//! is released and the order never existed; no partial order is observable at
//! any point.

use smallvec::SmallVec;
use std::sync::Arc;
use std::time::Instant;

use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::error::{LedgerError, OrderError};
use crate::ledger::{InventoryLedger, ReservationToken};
use crate::metrics;
use crate::store::OrderStore;
use crate::types::{
    Money, Order, OrderId, OrderItem, OrderLine, OrderStatus, PaymentSessionId, TicketTypeId,
    VariantId, VariantKind,
};

struct PricedLine {
    ticket_type: TicketTypeId,
    variant: VariantId,
    kind: VariantKind,
    quantity: u32,
    unit_price: Money,
}

/// Places orders against the catalog, ledger, and order store
pub struct ReservationEngine {
    catalog: Arc<Catalog>,
    ledger: Arc<InventoryLedger>,
    store: Arc<OrderStore>,
    clock: Arc<dyn Clock>,
}

impl ReservationEngine {
    /// Creates an engine over shared components
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        ledger: Arc<InventoryLedger>,
        store: Arc<OrderStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            ledger,
            store,
            clock,
        }
    }

    /// Places a multi-line order atomically.
    ///
    /// Duplicate lines for the same variant are merged before reserving.
    /// On success the order is `Created`, holds inventory for every line,
    /// and carries a payment session for the provider callback.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::EmptyOrder`] for no lines,
    /// [`OrderError::InvalidQuantity`] for a zero-quantity line,
    /// [`OrderError::UnknownVariant`] or [`OrderError::VariantInactive`] for
    /// unsellable variants, and [`OrderError::InsufficientInventory`] naming
    /// the first line the ledger could not cover. Any failure releases all
    /// holds taken so far and leaves inventory untouched.
    pub fn place_order(&self, user_email: &str, lines: &[OrderLine]) -> Result<Order, OrderError> {
        let started = Instant::now();
        let priced = self.validate_and_price(lines)?;

        let mut tokens: SmallVec<[ReservationToken; 4]> = SmallVec::new();
        for line in &priced {
            match self
                .ledger
                .try_reserve(line.ticket_type, line.variant, line.quantity)
            {
                Ok(token) => tokens.push(token),
                Err(err) => {
                    self.rollback(&tokens);
                    return Err(Self::map_reserve_error(line, &err));
                }
            }
        }

        let now = self.clock.now();
        let items: Vec<OrderItem> = priced
            .iter()
            .zip(tokens)
            .map(|(line, token)| OrderItem {
                ticket_type_id: line.ticket_type,
                variant_id: line.variant,
                kind: line.kind,
                quantity: line.quantity,
                unit_price: line.unit_price,
                hold: token,
            })
            .collect();
        let total = items
            .iter()
            .fold(Money::ZERO, |sum, item| sum.add(item.line_total()));

        let order = Order {
            id: OrderId::new(),
            user_email: user_email.to_string(),
            status: OrderStatus::Created,
            payment_session: Some(PaymentSessionId::new()),
            total,
            items,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(order.clone());

        let tickets = order.ticket_count();
        metrics::record_order_placed(tickets, started.elapsed().as_secs_f64());
        tracing::info!(
            order_id = %order.id,
            user_email = %order.user_email,
            lines = order.items.len(),
            tickets,
            total = %order.total,
            "Order placed"
        );
        Ok(order)
    }

    /// Validates every line against the catalog and prices it.
    ///
    /// Runs before any ledger debit so a malformed request cannot leave holds
    /// behind.
    fn validate_and_price(&self, lines: &[OrderLine]) -> Result<Vec<PricedLine>, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        // Merge duplicate variants, preserving first-seen order. A saturated
        // sum is harmless: the ledger rejects it as insufficient.
        let mut merged: Vec<(VariantId, u32)> = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    variant: line.variant_id,
                    quantity: 0,
                });
            }
            match merged
                .iter_mut()
                .find(|(variant, _)| *variant == line.variant_id)
            {
                Some((_, quantity)) => *quantity = quantity.saturating_add(line.quantity),
                None => merged.push((line.variant_id, line.quantity)),
            }
        }

        merged
            .into_iter()
            .map(|(variant_id, quantity)| {
                let variant = self
                    .catalog
                    .variant(variant_id)
                    .ok_or(OrderError::UnknownVariant(variant_id))?;
                if !variant.active {
                    return Err(OrderError::VariantInactive(variant_id));
                }
                Ok(PricedLine {
                    ticket_type: variant.ticket_type_id,
                    variant: variant_id,
                    kind: variant.kind,
                    quantity,
                    unit_price: variant.unit_price(),
                })
            })
            .collect()
    }

    fn rollback(&self, tokens: &[ReservationToken]) {
        for token in tokens.iter().rev() {
            if let Err(err) = self.ledger.release(token) {
                tracing::error!(
                    ticket_type = %token.ticket_type(),
                    quantity = token.quantity(),
                    error = %err,
                    "Rollback release failed"
                );
            }
        }
    }

    fn map_reserve_error(line: &PricedLine, err: &LedgerError) -> OrderError {
        match err {
            LedgerError::InsufficientInventory {
                requested,
                available,
            } => {
                metrics::record_insufficient_inventory();
                tracing::info!(
                    variant = %line.variant,
                    requested,
                    available,
                    "Order rejected, insufficient inventory"
                );
                OrderError::InsufficientInventory {
                    variant: line.variant,
                    requested: *requested,
                    available: *available,
                }
            }
            other => OrderError::Ledger(other.clone()),
        }
    }
}
