//! Order store: owns every order ever placed plus the transition audit log.
//!
//! Each order sits behind its own mutex so lifecycle transitions on the same
//! order serialize while different orders proceed independently. Orders are
//! never deleted; terminal orders stay queryable.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::types::{Order, OrderId, PaymentSessionId, TransitionRecord};

/// In-memory order repository with a payment-session index
#[derive(Debug, Default)]
pub struct OrderStore {
    orders: RwLock<HashMap<OrderId, Arc<Mutex<Order>>>>,
    by_session: RwLock<HashMap<PaymentSessionId, OrderId>>,
    audit: Mutex<Vec<TransitionRecord>>,
}

impl OrderStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly placed order and indexes its payment session
    pub fn insert(&self, order: Order) {
        if let Some(session) = order.payment_session.clone() {
            let mut by_session = self
                .by_session
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            by_session.insert(session, order.id);
        }
        let mut orders = self.orders.write().unwrap_or_else(PoisonError::into_inner);
        orders.insert(order.id, Arc::new(Mutex::new(order)));
    }

    /// Returns a point-in-time snapshot of an order
    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<Order> {
        let entry = self.entry(id)?;
        let order = entry.lock().unwrap_or_else(PoisonError::into_inner);
        Some(order.clone())
    }

    /// Resolves a payment session to the order it was issued for
    #[must_use]
    pub fn find_by_session(&self, session: &PaymentSessionId) -> Option<OrderId> {
        self.by_session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session)
            .copied()
    }

    /// Snapshot of every known order id
    #[must_use]
    pub fn order_ids(&self) -> Vec<OrderId> {
        self.orders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    /// Returns the number of orders ever placed
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Checks whether no order has been placed yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a transition to the audit log
    pub fn record_transition(&self, record: TransitionRecord) {
        let mut audit = self.audit.lock().unwrap_or_else(PoisonError::into_inner);
        audit.push(record);
    }

    /// Returns the audit trail of one order, in application order
    #[must_use]
    pub fn transitions_for(&self, id: OrderId) -> Vec<TransitionRecord> {
        self.audit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|record| record.order_id == id)
            .cloned()
            .collect()
    }

    /// Total number of recorded transitions
    #[must_use]
    pub fn transition_count(&self) -> usize {
        self.audit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// The lock entry for an order, used by the lifecycle to serialize
    /// transitions per order.
    pub(crate) fn entry(&self, id: OrderId) -> Option<Arc<Mutex<Order>>> {
        self.orders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }
}
