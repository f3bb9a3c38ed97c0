//! Buyer notification seam for confirmation and refund receipts.
//!
//! The lifecycle calls a [`Notifier`] after a transition commits and after
//! every order lock is dropped, so a slow provider can never stall the state
//! machine. In production this would front an email or push service; the
//! bundled implementations log or record instead.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use crate::types::{Order, OrderId};

/// Notification result
pub type NotifyResult<T> = Result<T, NotifierError>;

/// Notification delivery error
#[derive(Debug, Clone)]
pub enum NotifierError {
    /// The provider rejected or dropped the message
    Delivery {
        /// Provider-reported reason
        reason: String,
    },
    /// The provider did not answer in time
    Timeout,
}

impl std::fmt::Display for NotifierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delivery { reason } => write!(f, "Notification delivery failed: {reason}"),
            Self::Timeout => write!(f, "Notification provider timeout"),
        }
    }
}

impl std::error::Error for NotifierError {}

/// Outbound buyer notifications.
///
/// Implementations must tolerate replays upstream being filtered out: the
/// lifecycle guarantees at most one call per order per notification kind.
pub trait Notifier: Send + Sync {
    /// Send the purchase confirmation for a paid order
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be handed to the provider
    fn order_confirmed(&self, order: Order) -> Pin<Box<dyn Future<Output = NotifyResult<()>> + Send>>;

    /// Send the refund receipt for a refunded order
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be handed to the provider
    fn order_refunded(&self, order: Order) -> Pin<Box<dyn Future<Output = NotifyResult<()>> + Send>>;
}

/// Notifier that only logs (development default)
#[derive(Clone, Debug)]
pub struct LogNotifier;

impl LogNotifier {
    /// Creates a new logging notifier
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared() -> Arc<dyn Notifier> {
        Arc::new(Self::new())
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for LogNotifier {
    fn order_confirmed(&self, order: Order) -> Pin<Box<dyn Future<Output = NotifyResult<()>> + Send>> {
        Box::pin(async move {
            tracing::info!(
                order_id = %order.id,
                user_email = %order.user_email,
                total = %order.total,
                "Purchase confirmation queued"
            );
            Ok(())
        })
    }

    fn order_refunded(&self, order: Order) -> Pin<Box<dyn Future<Output = NotifyResult<()>> + Send>> {
        Box::pin(async move {
            tracing::info!(
                order_id = %order.id,
                user_email = %order.user_email,
                total = %order.total,
                "Refund receipt queued"
            );
            Ok(())
        })
    }
}

/// Notifier that records every delivery, for asserting exactly-once behavior
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    confirmed: Mutex<Vec<OrderId>>,
    refunded: Mutex<Vec<OrderId>>,
}

impl RecordingNotifier {
    /// Creates a new recording notifier
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an Arc-wrapped instance for sharing.
    ///
    /// The concrete handle stays usable for assertions while the trait-object
    /// clone is wired into the engine.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Orders a confirmation was delivered for, in delivery order
    #[must_use]
    pub fn confirmations(&self) -> Vec<OrderId> {
        self.confirmed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Orders a refund receipt was delivered for, in delivery order
    #[must_use]
    pub fn refunds(&self) -> Vec<OrderId> {
        self.refunded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn order_confirmed(&self, order: Order) -> Pin<Box<dyn Future<Output = NotifyResult<()>> + Send>> {
        self.confirmed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(order.id);
        Box::pin(async { Ok(()) })
    }

    fn order_refunded(&self, order: Order) -> Pin<Box<dyn Future<Output = NotifyResult<()>> + Send>> {
        self.refunded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(order.id);
        Box::pin(async { Ok(()) })
    }
}
