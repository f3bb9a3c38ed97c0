//! Configuration management for the box office server.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Order lifecycle configuration
    pub orders: OrdersConfig,
    /// Catalog source configuration
    pub catalog: CatalogConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Metrics server host (for Prometheus scraping)
    pub metrics_host: String,
    /// Metrics server port
    pub metrics_port: u16,
    /// How long to wait for background tasks to drain on shutdown
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Shutdown drain window as a std duration
    #[must_use]
    pub const fn shutdown_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Order lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersConfig {
    /// Payment window in seconds; unpaid orders older than this are swept
    pub payment_ttl_secs: u64,
    /// How often the background sweeper runs, in seconds
    pub sweep_interval_secs: u64,
    /// Maximum number of lines accepted in one order
    pub max_lines_per_order: usize,
}

impl OrdersConfig {
    /// Payment window as a chrono duration, for the lifecycle and sweeper
    #[must_use]
    pub fn payment_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.payment_ttl_secs).unwrap_or(i64::MAX))
    }

    /// Sweep cadence as a std duration, for the tokio interval
    #[must_use]
    pub const fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Catalog source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to a JSON catalog definition; when unset, the built-in demo
    /// catalog is seeded
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8080),
                log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
                metrics_host: env::var("METRICS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                metrics_port: env::var("METRICS_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(9090),
                shutdown_timeout_secs: env::var("SHUTDOWN_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            },
            orders: OrdersConfig {
                payment_ttl_secs: env::var("ORDER_PAYMENT_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900), // 15 minutes
                sweep_interval_secs: env::var("ORDER_SWEEP_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
                max_lines_per_order: env::var("ORDER_MAX_LINES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            },
            catalog: CatalogConfig {
                path: env::var("CATALOG_PATH").ok(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn order_defaults_apply_without_environment() {
        let config = Config::from_env();
        assert_eq!(config.orders.payment_ttl_secs, 900);
        assert_eq!(config.orders.sweep_interval_secs, 60);
        assert_eq!(config.orders.max_lines_per_order, 10);
    }
}
