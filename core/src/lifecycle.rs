//! Order lifecycle: the strict transition DAG and its side effects.
//!
//! Every transition runs under the order's own lock, so concurrent callbacks
//! on one order serialize and exactly one wins any race. The DAG is enforced
//! by re-checking the current status under that lock:
//!
//! - `Created -> Paid` on a confirm callback (notification sent once)
//! - `Created -> Failed` on a fail callback, cancellation, or expiry
//! - `Paid -> Refunded` on an operator refund
//!
//! Terminal states never transition again. Replayed provider callbacks
//! (confirm on `Paid`, fail on `Failed`) are idempotent no-ops; every other
//! off-DAG request is rejected and counted.
//!
//! Transitions that return inventory release the holds before flipping the
//! status. If the ledger reports corruption the transition aborts with the
//! order unchanged; already-credited holds are safe to retry because release
//! is idempotent. Notifications go out only after the order lock is dropped.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, PoisonError, TryLockError};

use crate::clock::Clock;
use crate::error::OrderError;
use crate::ledger::InventoryLedger;
use crate::metrics;
use crate::notifier::Notifier;
use crate::store::OrderStore;
use crate::types::{
    Order, OrderId, OrderStatus, PaymentSessionId, TransitionRecord, TransitionTrigger,
};

/// Drives orders through the lifecycle DAG
pub struct OrderLifecycle {
    store: Arc<OrderStore>,
    ledger: Arc<InventoryLedger>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl OrderLifecycle {
    /// Creates a lifecycle over shared components
    #[must_use]
    pub fn new(
        store: Arc<OrderStore>,
        ledger: Arc<InventoryLedger>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            ledger,
            notifier,
            clock,
        }
    }

    /// Confirms payment for the order behind a payment session.
    ///
    /// Idempotent: replaying the callback on an already paid order returns
    /// the order unchanged and sends no second confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::UnknownPaymentSession`] for an unknown session
    /// and [`OrderError::InvalidTransition`] if the order already failed or
    /// was refunded.
    pub async fn confirm_payment(&self, session: &PaymentSessionId) -> Result<Order, OrderError> {
        let order_id = self.resolve_session(session)?;
        let entry = self
            .store
            .entry(order_id)
            .ok_or(OrderError::UnknownOrder(order_id))?;

        let snapshot = {
            let mut order = entry.lock().unwrap_or_else(PoisonError::into_inner);
            match order.status {
                OrderStatus::Created => {}
                OrderStatus::Paid => {
                    tracing::debug!(order_id = %order.id, "Confirm replay ignored, order already paid");
                    return Ok(order.clone());
                }
                from => return Err(Self::reject(order.id, from, OrderStatus::Paid)),
            }
            order.status = OrderStatus::Paid;
            order.updated_at = self.clock.now();
            self.store.record_transition(TransitionRecord {
                order_id: order.id,
                from: OrderStatus::Created,
                to: OrderStatus::Paid,
                trigger: TransitionTrigger::PaymentCallback,
                at: order.updated_at,
            });
            order.clone()
        };

        metrics::record_order_paid(snapshot.total.cents());
        tracing::info!(
            order_id = %snapshot.id,
            total = %snapshot.total,
            "Payment confirmed"
        );
        if let Err(err) = self.notifier.order_confirmed(snapshot.clone()).await {
            tracing::warn!(
                order_id = %snapshot.id,
                error = %err,
                "Confirmation notification failed"
            );
        }
        Ok(snapshot)
    }

    /// Marks the order behind a payment session as failed and returns its
    /// inventory.
    ///
    /// Idempotent for provider retries: replaying the callback on an already
    /// failed order is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::UnknownPaymentSession`] for an unknown session,
    /// [`OrderError::InvalidTransition`] if the order is paid or refunded, or
    /// [`OrderError::Ledger`] if a hold could not be credited back.
    pub fn fail_payment(&self, session: &PaymentSessionId) -> Result<Order, OrderError> {
        let order_id = self.resolve_session(session)?;
        self.fail_order(order_id, TransitionTrigger::PaymentCallback)
    }

    /// Cancels an unpaid order at the buyer's request and returns its
    /// inventory.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::UnknownOrder`] for an unknown id,
    /// [`OrderError::InvalidTransition`] unless the order is still `Created`,
    /// or [`OrderError::Ledger`] if a hold could not be credited back.
    pub fn cancel_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.fail_order(order_id, TransitionTrigger::Cancellation)
    }

    /// Refunds a paid order: returns its inventory and sends a refund
    /// receipt.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::UnknownOrder`] for an unknown id,
    /// [`OrderError::InvalidTransition`] unless the order is `Paid`, or
    /// [`OrderError::Ledger`] if a hold could not be credited back.
    pub async fn refund(&self, order_id: OrderId) -> Result<Order, OrderError> {
        let entry = self
            .store
            .entry(order_id)
            .ok_or(OrderError::UnknownOrder(order_id))?;

        let snapshot = {
            let mut order = entry.lock().unwrap_or_else(PoisonError::into_inner);
            match order.status {
                OrderStatus::Paid => {}
                from => return Err(Self::reject(order.id, from, OrderStatus::Refunded)),
            }
            self.release_items(&order)?;
            order.status = OrderStatus::Refunded;
            order.updated_at = self.clock.now();
            self.store.record_transition(TransitionRecord {
                order_id: order.id,
                from: OrderStatus::Paid,
                to: OrderStatus::Refunded,
                trigger: TransitionTrigger::Refund,
                at: order.updated_at,
            });
            order.clone()
        };

        metrics::record_order_refunded(snapshot.total.cents(), snapshot.ticket_count());
        tracing::info!(
            order_id = %snapshot.id,
            total = %snapshot.total,
            tickets = snapshot.ticket_count(),
            "Order refunded"
        );
        if let Err(err) = self.notifier.order_refunded(snapshot.clone()).await {
            tracing::warn!(
                order_id = %snapshot.id,
                error = %err,
                "Refund notification failed"
            );
        }
        Ok(snapshot)
    }

    /// Returns a point-in-time snapshot of an order
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::UnknownOrder`] for an unknown id.
    pub fn order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.store
            .get(order_id)
            .ok_or(OrderError::UnknownOrder(order_id))
    }

    /// Reclaims every unpaid order older than `ttl`: each one is failed with
    /// an `Expiry` trigger and its inventory returned. Returns how many
    /// orders were reclaimed.
    ///
    /// Safe to run while payments are being confirmed: contended orders are
    /// skipped until the next pass, and the status re-check under each
    /// order's lock settles any race in favor of the transition that got
    /// there first.
    pub fn sweep_expired(&self, ttl: Duration) -> usize {
        let cutoff = self.clock.now() - ttl;
        let mut reaped = 0usize;
        for order_id in self.store.order_ids() {
            if self.expire_if_stale(order_id, cutoff) {
                reaped += 1;
            }
        }
        metrics::record_sweep(reaped as u64);
        if reaped > 0 {
            tracing::info!(reaped, %cutoff, "Sweep reclaimed stale unpaid orders");
        }
        reaped
    }

    /// Expires the order if it is still unpaid and was created at or before
    /// the cutoff. Returns whether the order was expired.
    ///
    /// Uses `try_lock`: an order mid-transition is skipped rather than waited
    /// on, and the status re-check under the lock makes losing a race with a
    /// payment callback harmless.
    pub(crate) fn expire_if_stale(&self, order_id: OrderId, cutoff: DateTime<Utc>) -> bool {
        let Some(entry) = self.store.entry(order_id) else {
            return false;
        };
        let mut order = match entry.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                tracing::trace!(order_id = %order_id, "Sweep skipped contended order");
                return false;
            }
        };
        if order.status != OrderStatus::Created || order.created_at > cutoff {
            return false;
        }
        if self.release_items(&order).is_err() {
            // Error already logged; the next pass retries.
            return false;
        }
        order.status = OrderStatus::Failed;
        order.updated_at = self.clock.now();
        self.store.record_transition(TransitionRecord {
            order_id: order.id,
            from: OrderStatus::Created,
            to: OrderStatus::Failed,
            trigger: TransitionTrigger::Expiry,
            at: order.updated_at,
        });
        let tickets = order.ticket_count();
        let created_at = order.created_at;
        drop(order);

        metrics::record_order_failed(TransitionTrigger::Expiry.as_str(), tickets);
        tracing::info!(
            order_id = %order_id,
            tickets,
            %created_at,
            "Expired stale unpaid order"
        );
        true
    }

    fn fail_order(
        &self,
        order_id: OrderId,
        trigger: TransitionTrigger,
    ) -> Result<Order, OrderError> {
        let entry = self
            .store
            .entry(order_id)
            .ok_or(OrderError::UnknownOrder(order_id))?;

        let snapshot = {
            let mut order = entry.lock().unwrap_or_else(PoisonError::into_inner);
            match order.status {
                OrderStatus::Created => {}
                OrderStatus::Failed if trigger == TransitionTrigger::PaymentCallback => {
                    tracing::debug!(order_id = %order.id, "Fail replay ignored, order already failed");
                    return Ok(order.clone());
                }
                from => return Err(Self::reject(order.id, from, OrderStatus::Failed)),
            }
            self.release_items(&order)?;
            order.status = OrderStatus::Failed;
            order.updated_at = self.clock.now();
            self.store.record_transition(TransitionRecord {
                order_id: order.id,
                from: OrderStatus::Created,
                to: OrderStatus::Failed,
                trigger,
                at: order.updated_at,
            });
            order.clone()
        };

        metrics::record_order_failed(trigger.as_str(), snapshot.ticket_count());
        tracing::info!(
            order_id = %snapshot.id,
            %trigger,
            tickets = snapshot.ticket_count(),
            "Order failed, inventory returned"
        );
        Ok(snapshot)
    }

    /// Credits every hold on the order back to the ledger.
    ///
    /// Stops at the first corruption so the caller can abort the transition;
    /// holds credited before the stop stay credited, which is safe because a
    /// retried release is a no-op.
    fn release_items(&self, order: &Order) -> Result<(), OrderError> {
        for item in &order.items {
            self.ledger.release(&item.hold).map_err(|err| {
                tracing::error!(
                    order_id = %order.id,
                    ticket_type = %item.hold.ticket_type(),
                    error = %err,
                    "Hold release failed, aborting transition"
                );
                OrderError::Ledger(err)
            })?;
        }
        Ok(())
    }

    fn resolve_session(&self, session: &PaymentSessionId) -> Result<OrderId, OrderError> {
        self.store
            .find_by_session(session)
            .ok_or_else(|| OrderError::UnknownPaymentSession(session.clone()))
    }

    fn reject(order: OrderId, from: OrderStatus, to: OrderStatus) -> OrderError {
        metrics::record_rejected_transition(from.as_str(), to.as_str());
        tracing::warn!(order_id = %order, %from, %to, "Transition rejected");
        OrderError::InvalidTransition { order, from, to }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::{TicketType, TicketVariant};
    use crate::clock::SystemClock;
    use crate::notifier::RecordingNotifier;
    use crate::types::{Money, OrderItem, PerformanceId, TicketTypeId, VariantId, VariantKind};

    struct Fixture {
        lifecycle: OrderLifecycle,
        ledger: Arc<InventoryLedger>,
        store: Arc<OrderStore>,
        notifier: Arc<RecordingNotifier>,
        ticket_type: TicketTypeId,
    }

    /// A 10-seat ticket type with one placed two-ticket order per call site.
    fn fixture() -> Fixture {
        let ticket_type = TicketType {
            id: TicketTypeId::new(),
            performance_id: PerformanceId::new(),
            name: "Stalls".to_string(),
            price: Money::from_cents(8_000),
            initial_quantity: 10,
        };
        let variant = TicketVariant {
            id: VariantId::new(),
            ticket_type_id: ticket_type.id,
            kind: VariantKind::Full,
            price: Money::from_cents(8_000),
            fee: Money::from_cents(800),
            discount_pct: None,
            cap: None,
            active: true,
        };
        let ledger = Arc::new(InventoryLedger::new());
        ledger.register(&ticket_type, [&variant]).unwrap();

        let store = Arc::new(OrderStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let lifecycle = OrderLifecycle::new(
            Arc::clone(&store),
            Arc::clone(&ledger),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            Arc::new(SystemClock),
        );
        Fixture {
            lifecycle,
            ledger,
            store,
            notifier,
            ticket_type: ticket_type.id,
        }
    }

    /// Reserves 2 tickets and stores the backing order.
    fn place(fix: &Fixture) -> Order {
        let variant = VariantId::new();
        let token = fix
            .ledger
            .try_reserve(fix.ticket_type, variant, 2)
            .unwrap();

        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            user_email: "ana@example.com".to_string(),
            status: OrderStatus::Created,
            payment_session: Some(PaymentSessionId::new()),
            total: Money::from_cents(17_600),
            items: vec![OrderItem {
                ticket_type_id: fix.ticket_type,
                variant_id: variant,
                kind: VariantKind::Full,
                quantity: 2,
                unit_price: Money::from_cents(8_800),
                hold: token,
            }],
            created_at: now,
            updated_at: now,
        };
        fix.store.insert(order.clone());
        order
    }

    fn available(fix: &Fixture) -> u32 {
        fix.ledger.availability(fix.ticket_type).unwrap().available
    }

    fn session(order: &Order) -> PaymentSessionId {
        order.payment_session.clone().unwrap()
    }

    #[tokio::test]
    async fn confirm_marks_paid_and_notifies_once() {
        let fix = fixture();
        let order = place(&fix);

        let paid = fix.lifecycle.confirm_payment(&session(&order)).await.unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
        // Paid orders keep their inventory held
        assert_eq!(available(&fix), 8);
        assert_eq!(fix.notifier.confirmations(), vec![order.id]);

        let trail = fix.store.transitions_for(order.id);
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].trigger, TransitionTrigger::PaymentCallback);
    }

    #[tokio::test]
    async fn confirm_replay_is_idempotent() {
        let fix = fixture();
        let order = place(&fix);
        let sess = session(&order);

        fix.lifecycle.confirm_payment(&sess).await.unwrap();
        let replay = fix.lifecycle.confirm_payment(&sess).await.unwrap();

        assert_eq!(replay.status, OrderStatus::Paid);
        // Exactly one confirmation and one audit record
        assert_eq!(fix.notifier.confirmations().len(), 1);
        assert_eq!(fix.store.transitions_for(order.id).len(), 1);
    }

    #[tokio::test]
    async fn confirm_unknown_session_is_rejected() {
        let fix = fixture();
        let err = fix
            .lifecycle
            .confirm_payment(&PaymentSessionId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::UnknownPaymentSession(_)));
    }

    #[tokio::test]
    async fn confirm_after_fail_is_rejected() {
        let fix = fixture();
        let order = place(&fix);
        let sess = session(&order);

        fix.lifecycle.fail_payment(&sess).unwrap();
        let err = fix.lifecycle.confirm_payment(&sess).await.unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidTransition {
                order: order.id,
                from: OrderStatus::Failed,
                to: OrderStatus::Paid,
            }
        );
        // Inventory stayed returned
        assert_eq!(available(&fix), 10);
    }

    #[test]
    fn fail_returns_inventory() {
        let fix = fixture();
        let order = place(&fix);
        assert_eq!(available(&fix), 8);

        let failed = fix.lifecycle.fail_payment(&session(&order)).unwrap();
        assert_eq!(failed.status, OrderStatus::Failed);
        assert_eq!(available(&fix), 10);
    }

    #[test]
    fn fail_replay_is_idempotent() {
        let fix = fixture();
        let order = place(&fix);
        let sess = session(&order);

        fix.lifecycle.fail_payment(&sess).unwrap();
        let replay = fix.lifecycle.fail_payment(&sess).unwrap();

        assert_eq!(replay.status, OrderStatus::Failed);
        // Inventory credited exactly once
        assert_eq!(available(&fix), 10);
        assert_eq!(fix.store.transitions_for(order.id).len(), 1);
    }

    #[test]
    fn cancel_fails_order_with_cancellation_trigger() {
        let fix = fixture();
        let order = place(&fix);

        let cancelled = fix.lifecycle.cancel_order(order.id).unwrap();
        assert_eq!(cancelled.status, OrderStatus::Failed);
        assert_eq!(available(&fix), 10);
        assert_eq!(
            fix.store.transitions_for(order.id)[0].trigger,
            TransitionTrigger::Cancellation
        );

        // Cancellation is not a provider callback, so no replay leniency
        let err = fix.lifecycle.cancel_order(order.id).unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn refund_requires_paid() {
        let fix = fixture();
        let order = place(&fix);

        let err = fix.lifecycle.refund(order.id).await.unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidTransition {
                order: order.id,
                from: OrderStatus::Created,
                to: OrderStatus::Refunded,
            }
        );
    }

    #[tokio::test]
    async fn refund_returns_inventory_and_notifies() {
        let fix = fixture();
        let order = place(&fix);
        fix.lifecycle.confirm_payment(&session(&order)).await.unwrap();
        assert_eq!(available(&fix), 8);

        let refunded = fix.lifecycle.refund(order.id).await.unwrap();
        assert_eq!(refunded.status, OrderStatus::Refunded);
        assert_eq!(available(&fix), 10);
        assert_eq!(fix.notifier.refunds(), vec![order.id]);

        // Refunded is terminal
        let err = fix.lifecycle.refund(order.id).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
        assert_eq!(fix.notifier.refunds().len(), 1);
    }

    #[tokio::test]
    async fn lost_expiry_race_leaves_paid_order_alone() {
        let fix = fixture();
        let order = place(&fix);
        fix.lifecycle.confirm_payment(&session(&order)).await.unwrap();

        let expired = fix.lifecycle.expire_if_stale(order.id, Utc::now());
        assert!(!expired);
        assert_eq!(fix.lifecycle.order(order.id).unwrap().status, OrderStatus::Paid);
        assert_eq!(available(&fix), 8);
    }

    #[test]
    fn expire_reaps_only_stale_created_orders() {
        let fix = fixture();
        let order = place(&fix);

        // Cutoff before creation: still fresh
        assert!(!fix
            .lifecycle
            .expire_if_stale(order.id, order.created_at - chrono::Duration::seconds(1)));
        assert_eq!(available(&fix), 8);

        // Cutoff at creation: stale, reaped
        assert!(fix.lifecycle.expire_if_stale(order.id, order.created_at));
        assert_eq!(fix.lifecycle.order(order.id).unwrap().status, OrderStatus::Failed);
        assert_eq!(available(&fix), 10);
        assert_eq!(
            fix.store.transitions_for(order.id)[0].trigger,
            TransitionTrigger::Expiry
        );

        // Already failed: nothing left to reap
        assert!(!fix.lifecycle.expire_if_stale(order.id, Utc::now()));
    }

    #[test]
    fn expire_skips_contended_orders() {
        let fix = fixture();
        let order = place(&fix);

        let entry = fix.store.entry(order.id).unwrap();
        let guard = entry.lock().unwrap();
        assert!(!fix.lifecycle.expire_if_stale(order.id, Utc::now()));
        drop(guard);

        assert!(fix.lifecycle.expire_if_stale(order.id, Utc::now()));
    }

    #[test]
    fn fail_after_external_release_does_not_double_credit() {
        let fix = fixture();
        let order = place(&fix);

        // Hold already credited out of band: the transition's own release is
        // a replay no-op, so the order still fails without double crediting.
        fix.ledger.release(&order.items[0].hold).unwrap();
        let failed = fix.lifecycle.fail_payment(&session(&order)).unwrap();
        assert_eq!(failed.status, OrderStatus::Failed);
        assert_eq!(available(&fix), 10);
    }

    #[test]
    fn reject_error_carries_the_attempted_edge() {
        let order = OrderId::new();
        let err = OrderLifecycle::reject(order, OrderStatus::Failed, OrderStatus::Paid);
        assert_eq!(
            err,
            OrderError::InvalidTransition {
                order,
                from: OrderStatus::Failed,
                to: OrderStatus::Paid,
            }
        );
    }
}
