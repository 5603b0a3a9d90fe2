//! Integration tests for the liveness endpoints.

use axum::http::StatusCode;
use shared::models::Observation;
use shared::source::StaticSource;

use super::common::{get, test_app, test_app_with};

#[tokio::test]
async fn test_health_check() {
    let (app, _state, _clock, _dir) = test_app();

    let (status, response) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "healthy");
    assert_eq!(response["service"], "fundingwatch-api");
}

#[tokio::test]
async fn test_exchange_health_is_degraded_when_one_is_down() {
    let (app, _state, _clock, _dir) = test_app();

    let (status, response) = get(app, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "degraded");
    assert_eq!(response["exchanges"], 3);
    assert_eq!(response["exchange_info"]["alpha"]["healthy"], true);
    assert_eq!(response["exchange_info"]["beta"]["healthy"], true);
    assert_eq!(response["exchange_info"]["gamma"]["healthy"], false);
    assert_eq!(response["timestamp"], "2024-01-15T08:00:00Z");
}

#[tokio::test]
async fn test_exchange_health_is_healthy_when_all_answer() {
    let (app, _state, _clock, _dir) = test_app_with(vec![StaticSource::new(
        "alpha",
        vec![Observation::new("BTCUSDT", "alpha", 0.0001)],
    )]);

    let (status, response) = get(app, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "healthy");
    assert_eq!(response["exchanges"], 1);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _state, _clock, _dir) = test_app();

    let (status, _) = get(app, "/api/nothing-here").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
