//! Reconciliation sweeper: the periodic driver for expiring stale orders.
//!
//! The engine never trusts payment providers to deliver a callback for every
//! session. This task periodically asks the lifecycle to reclaim unpaid
//! orders older than the payment TTL, returning their inventory to sale.
//! The scan itself lives in [`OrderLifecycle::sweep_expired`]; this type only
//! owns the schedule.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::lifecycle::OrderLifecycle;

/// Periodically reclaims unpaid orders whose payment TTL has elapsed
pub struct ExpirySweeper {
    lifecycle: Arc<OrderLifecycle>,
    ttl: chrono::Duration,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl ExpirySweeper {
    /// Creates a sweeper that reaps orders older than `ttl` every `interval`,
    /// paired with the sender that stops its run loop.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // In signal handler:
    /// shutdown.send(true).ok();
    /// ```
    #[must_use]
    pub fn new(
        lifecycle: Arc<OrderLifecycle>,
        ttl: chrono::Duration,
        interval: Duration,
    ) -> (Self, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let sweeper = Self {
            lifecycle,
            ttl,
            interval,
            shutdown: shutdown_rx,
        };

        (sweeper, shutdown_tx)
    }

    /// Runs one sweep pass with the configured TTL, returning how many
    /// orders were reclaimed
    pub fn sweep_once(&self) -> usize {
        self.lifecycle.sweep_expired(self.ttl)
    }

    /// Runs the sweep loop until a shutdown signal is received
    pub async fn run(mut self) {
        tracing::info!(
            ttl_secs = self.ttl.num_seconds(),
            interval_secs = self.interval.as_secs(),
            "Expiry sweeper started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        while !*self.shutdown.borrow() {
            tokio::select! {
                _ = ticker.tick() => {
                    let reaped = self.sweep_once();
                    if reaped > 0 {
                        tracing::info!(reaped, "Sweeper pass reclaimed orders");
                    }
                }
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        tracing::info!("Shutdown signal received");
                        break;
                    }
                }
            }
        }
        tracing::info!("Expiry sweeper stopped");
    }
}
