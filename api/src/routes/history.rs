//! Funding rate history endpoint.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use shared::models::HistoryPoint;

use super::error::ApiError;
use crate::state::AppState;

/// Query parameters for a history request.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Exchange whose history to reconstruct. Required.
    pub exchange: Option<String>,
}

/// Creates the history routes.
pub fn history_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/history/{symbol}", get(get_history))
        .with_state(state)
}

/// Handler for GET /api/history/{symbol}?exchange=.
///
/// Reconstructs the exchange's funding rate history for the symbol from
/// every day-file. An unknown symbol yields an empty array.
async fn get_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryPoint>>, ApiError> {
    let Some(exchange) = query.exchange.filter(|e| !e.trim().is_empty()) else {
        return Err(ApiError::bad_request(
            "missing_exchange",
            "Query parameter 'exchange' is required",
        ));
    };

    let points = state
        .log()
        .run_blocking(move |log| log.reconstruct_history(&symbol, &exchange))
        .await?;
    Ok(Json(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use shared::models::Observation;
    use tower::ServiceExt;

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
    async fn test_history_for_exchange() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::with_log_dir(dir.path());
        for rate in [0.0001, 0.0002] {
            state
                .log()
                .append(
                    "BTCUSDT",
                    &[
                        Observation::new("BTCUSDT", "alpha", rate),
                        Observation::new("BTCUSDT", "beta", -rate),
                    ],
                )
                .unwrap();
        }

        let (status, body) = get(history_routes(state), "/api/history/BTCUSDT?exchange=beta").await;

        assert_eq!(status, StatusCode::OK);
        let points = body.as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0]["funding_rate"], -0.0001);
        assert!(points[0]["timestamp"].is_i64());
    }

    #[tokio::test]
    async fn test_history_without_exchange_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let app = history_routes(AppState::with_log_dir(dir.path()));

        let (status, body) = get(app, "/api/history/BTCUSDT").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_exchange");
    }

    #[tokio::test]
    async fn test_history_unknown_symbol_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let app = history_routes(AppState::with_log_dir(dir.path()));

        let (status, body) = get(app, "/api/history/NOPE?exchange=alpha").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());
    }
}
