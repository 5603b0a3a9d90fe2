//! Fundingwatch API Server
//!
//! This crate provides the HTTP server of the Fundingwatch funding rate
//! aggregator. It wires the exchange adapters into the aggregator, runs the
//! periodic collection rounds that feed the time-series log, and serves the
//! live and historical views.
//!
//! # Architecture
//!
//! The API server is built on Axum and Tokio, providing:
//! - Live funding rates, unified or per exchange
//! - Exchange liveness
//! - Day-file browsing and history reconstruction from the log
//!
//! # Example
//!
//! ```no_run
//! use api::run_server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_server().await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod exchanges;
mod routes;
pub mod scheduler;
mod state;

pub use config::{Config, ConfigError, ExchangeConfig};
pub use routes::ErrorBody;
pub use scheduler::{CollectionScheduler, RoundOutcome, RoundSummary};
pub use state::AppState;

use anyhow::Result;
use axum::Router;
use shared::aggregator::Aggregator;
use shared::clock::{Clock, SystemClock};
use shared::storage::TimeSeriesLog;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Runs the Fundingwatch API server.
///
/// This function initializes the server with configuration from environment variables
/// and starts listening for incoming connections. It handles graceful shutdown on
/// SIGTERM/SIGINT signals.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - The server fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server() -> Result<()> {
    let config = Config::from_env()?;
    run_server_with_config(config).await
}

/// Runs the Fundingwatch API server with the provided configuration.
///
/// This is useful for testing or when you want to provide configuration programmatically.
///
/// # Errors
///
/// Returns an error if:
/// - An exchange client cannot be created
/// - The server fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server_with_config(config: Config) -> Result<()> {
    tracing::info!(
        host = %config.host,
        port = %config.port,
        log_dir = %config.log_dir.display(),
        log_format = %config.log_format,
        exchanges = config.exchanges.len(),
        "Fundingwatch API server starting"
    );

    let timeout = config.collection.source_timeout();
    let sources = exchanges::build_sources(&config.exchanges, timeout)?;
    let aggregator = Arc::new(Aggregator::with_sources(sources, timeout));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let log = Arc::new(TimeSeriesLog::new(
        &config.log_dir,
        Arc::clone(&clock),
        config.log_format.codec(),
    ));
    let state = AppState::new(aggregator, log, clock);

    let scheduler = Arc::new(CollectionScheduler::new(&state, config.collection.interval()));
    let scheduler_handle = tokio::spawn(scheduler.run());

    let app = build_router(state, config.static_dir.as_deref());
    let listener = TcpListener::bind(config.bind_addr()).await?;

    tracing::info!(addr = %listener.local_addr()?, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler_handle.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Creates the main application router with all routes and middleware.
///
/// This function is public to allow testing the router without starting a full server.
pub fn create_router(state: AppState) -> Router {
    build_router(state, None)
}

fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut router = Router::new()
        .merge(routes::health_routes(state.clone()))
        .merge(routes::funding_routes(state.clone()))
        .merge(routes::logs_routes(state.clone()))
        .merge(routes::history_routes(state));

    if let Some(dir) = static_dir {
        tracing::info!(dir = %dir.display(), "Serving static files");
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
