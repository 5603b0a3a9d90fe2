//! Health check endpoints.
//!
//! `/health` answers as long as the process is up. `/api/health` probes every
//! registered exchange.

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::ProviderStatus;
use std::collections::BTreeMap;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status (always "healthy" if reachable).
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Exchange liveness response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExchangeHealthResponse {
    /// `healthy` when every exchange answers, `degraded` otherwise.
    pub status: String,
    /// When the probes ran.
    pub timestamp: DateTime<Utc>,
    /// Number of registered exchanges.
    pub exchanges: usize,
    /// Per-exchange liveness.
    pub exchange_info: BTreeMap<String, ProviderStatus>,
}

/// Creates the health check routes.
pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/health", get(exchange_health))
        .with_state(state)
}

/// Health check handler.
///
/// Returns a simple JSON response indicating the service is healthy.
/// This endpoint is intended for use by load balancers and monitoring systems.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "fundingwatch-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn exchange_health(State(state): State<AppState>) -> Json<ExchangeHealthResponse> {
    let exchange_info = state.aggregator().status().await;
    let status = if exchange_info.values().all(|s| s.healthy) {
        "healthy"
    } else {
        "degraded"
    };

    Json(ExchangeHealthResponse {
        status: status.to_string(),
        timestamp: state.clock().now(),
        exchanges: exchange_info.len(),
        exchange_info,
    })
}
