//! Box office HTTP server.
//!
//! Wires the reservation and order lifecycle engine to its HTTP surface:
//! configuration from the environment, a Prometheus exporter on its own
//! listener, the background expiry sweeper, and graceful shutdown.

use boxoffice_core::{metrics::register_business_metrics, Boxoffice, ExpirySweeper};
use boxoffice_server::{build_router, seed::load_catalog, AppState, Config};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present, before anything reads the environment
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.server.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Box Office HTTP Server");
    info!(
        host = %config.server.host,
        port = config.server.port,
        payment_ttl_secs = config.orders.payment_ttl_secs,
        sweep_interval_secs = config.orders.sweep_interval_secs,
        "Configuration loaded"
    );

    // Install the Prometheus exporter on its own listener
    let metrics_addr: SocketAddr = format!(
        "{}:{}",
        config.server.metrics_host, config.server.metrics_port
    )
    .parse()?;
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()?;
    register_business_metrics();
    info!(address = %metrics_addr, "Prometheus exporter listening");

    // Load the catalog and assemble the engine
    let catalog = load_catalog(&config.catalog)?;
    let boxoffice = Arc::new(Boxoffice::new(catalog)?);

    // Start the background expiry sweeper
    let (sweeper, sweeper_shutdown) = ExpirySweeper::new(
        boxoffice.lifecycle(),
        config.orders.payment_ttl(),
        config.orders.sweep_interval(),
    );
    let sweeper_handle = tokio::spawn(sweeper.run());

    // Build application state and router
    let state = AppState::new(Arc::clone(&boxoffice), config.orders.clone());
    let app = build_router(state);

    // Create server address
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(address = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the sweeper once the server has drained
    sweeper_shutdown.send(true).ok();
    if tokio::time::timeout(config.server.shutdown_timeout(), sweeper_handle)
        .await
        .is_err()
    {
        tracing::warn!("Expiry sweeper did not stop within the shutdown window");
    }

    info!("Server stopped");
    Ok(())
}

/// Graceful shutdown signal handler.
///
/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (in production environments)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
