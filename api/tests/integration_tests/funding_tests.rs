//! Integration tests for the live funding endpoints.

use axum::http::StatusCode;

use super::common::{get, test_app};

#[tokio::test]
async fn test_all_rates_merge_every_answering_exchange() {
    let (app, _state, _clock, _dir) = test_app();

    let (status, response) = get(app, "/api/funding").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["total"], 3);
    let rates = response["rates"].as_array().unwrap();
    assert_eq!(rates.len(), 3);
    assert!(rates.iter().all(|r| r["exchange"] != "gamma"));
    assert!(rates
        .iter()
        .any(|r| r["exchange"] == "beta" && r["symbol"] == "BTCUSDT"));
}

#[tokio::test]
async fn test_single_exchange_rates() {
    let (app, _state, _clock, _dir) = test_app();

    let (status, response) = get(app, "/api/funding/alpha").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["exchange"], "alpha");
    assert_eq!(response["total"], 2);
    assert_eq!(response["rates"][0]["mark_price"], 42000.5);
}

#[tokio::test]
async fn test_unknown_exchange_is_404() {
    let (app, _state, _clock, _dir) = test_app();

    let (status, response) = get(app, "/api/funding/kraken").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["error"], "exchange_not_found");
    assert_eq!(response["message"], "Exchange not found: kraken");
}

#[tokio::test]
async fn test_failing_exchange_is_502() {
    let (app, _state, _clock, _dir) = test_app();

    let (status, response) = get(app, "/api/funding/gamma").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(response["error"], "exchange_unavailable");
}

#[tokio::test]
async fn test_live_reads_do_not_write_the_log() {
    let (app, _state, _clock, _dir) = test_app();

    let (status, _) = get(app.clone(), "/api/funding").await;
    assert_eq!(status, StatusCode::OK);

    let (status, response) = get(app, "/api/logs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 0);
}
