//! Application state for the box office HTTP server.

use boxoffice_core::Boxoffice;
use std::sync::Arc;

use crate::config::OrdersConfig;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via Arc) for each request. The engine carries all domain
/// state; the order policy knobs come from [`crate::config::Config`].
#[derive(Clone)]
pub struct AppState {
    /// The assembled box office engine
    pub boxoffice: Arc<Boxoffice>,
    /// Order policy: payment window, sweep cadence, line limit
    pub orders: OrdersConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub const fn new(boxoffice: Arc<Boxoffice>, orders: OrdersConfig) -> Self {
        Self { boxoffice, orders }
    }
}
