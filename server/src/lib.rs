//! Box Office Server - HTTP surface over the `boxoffice-core` engine
//!
//! Exposes the reservation and order lifecycle engine as a JSON API:
//!
//! - **Orders**: place, read, cancel, refund (`/api/orders`)
//! - **Payments**: idempotent provider callbacks (`/api/payments/:session/...`)
//! - **Availability**: ledger snapshots (`/api/ticket-types/:id/availability`)
//! - **Operations**: forced sweep pass (`/internal/sweep`), health probes
//!
//! The engine itself is entirely in-process; the server adds configuration,
//! the Prometheus exporter, the background expiry sweeper, and graceful
//! shutdown around it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod health;
pub mod routes;
pub mod seed;
pub mod state;

pub use config::Config;
pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
