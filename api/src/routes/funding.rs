//! Live funding rate endpoints.
//!
//! - `GET /api/funding` - rates from every exchange that answered
//! - `GET /api/funding/{exchange}` - rates from one exchange

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::Observation;

use super::error::ApiError;
use crate::state::AppState;

/// Unified live view.
#[derive(Debug, Serialize, Deserialize)]
pub struct FundingResponse {
    /// When the view was assembled.
    pub timestamp: DateTime<Utc>,
    /// Rates from every exchange that answered.
    pub rates: Vec<Observation>,
    /// Number of rates.
    pub total: usize,
}

/// Single exchange live view.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExchangeFundingResponse {
    /// Exchange name.
    pub exchange: String,
    /// When the view was assembled.
    pub timestamp: DateTime<Utc>,
    /// Rates from the exchange.
    pub rates: Vec<Observation>,
    /// Number of rates.
    pub total: usize,
}

/// Creates the live funding routes.
pub fn funding_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/funding", get(get_all_rates))
        .route("/api/funding/{exchange}", get(get_exchange_rates))
        .with_state(state)
}

/// Handler for GET /api/funding.
///
/// Never fails: exchanges that are down are left out of the result.
async fn get_all_rates(State(state): State<AppState>) -> Json<FundingResponse> {
    let collection = state.aggregator().collect_all().await;
    let rates = collection.observations;

    Json(FundingResponse {
        timestamp: state.clock().now(),
        total: rates.len(),
        rates,
    })
}

/// Handler for GET /api/funding/{exchange}.
///
/// Returns 404 for an unknown exchange and 502 when the exchange fails.
async fn get_exchange_rates(
    State(state): State<AppState>,
    Path(exchange): Path<String>,
) -> Result<Json<ExchangeFundingResponse>, ApiError> {
    let rates = state.aggregator().collect_one(&exchange).await?;

    Ok(Json(ExchangeFundingResponse {
        exchange,
        timestamp: state.clock().now(),
        total: rates.len(),
        rates,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use shared::source::{SourceError, StaticSource};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_router() -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::with_log_dir(dir.path());
        state.aggregator().register_source(Arc::new(StaticSource::new(
            "alpha",
            vec![Observation::new("BTCUSDT", "alpha", 0.0001)],
        )));
        state.aggregator().register_source(Arc::new(StaticSource::failing(
            "beta",
            SourceError::Http("connection refused".to_string()),
        )));
        (funding_routes(state), dir)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_all_rates_skip_failing_exchange() {
        let (app, _dir) = create_test_router();

        let (status, body) = get(app, "/api/funding").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["rates"][0]["symbol"], "BTCUSDT");
        assert_eq!(body["rates"][0]["exchange"], "alpha");
        assert_eq!(body["rates"][0]["funding_rate"], 0.0001);
    }

    #[tokio::test]
    async fn test_exchange_rates() {
        let (app, _dir) = create_test_router();

        let (status, body) = get(app, "/api/funding/alpha").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["exchange"], "alpha");
        assert_eq!(body["total"], 1);
    }

    #[tokio::test]
    async fn test_unknown_exchange_is_404() {
        let (app, _dir) = create_test_router();

        let (status, body) = get(app, "/api/funding/kraken").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "exchange_not_found");
    }

    #[tokio::test]
    async fn test_failing_exchange_is_502() {
        let (app, _dir) = create_test_router();

        let (status, body) = get(app, "/api/funding/beta").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "exchange_unavailable");
        assert!(body["message"].as_str().unwrap().contains("connection refused"));
    }
}
