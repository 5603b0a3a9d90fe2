//! Integration tests for log browsing.
//!
//! Tests cover:
//! - Listing day-files across instruments
//! - Decoded and raw single-day reads
//! - Date and instrument validation

use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use shared::models::Observation;

use super::common::{get, get_raw, test_app};

fn seed(state: &api::AppState) {
    state
        .log()
        .append(
            "BTCUSDT",
            &[
                Observation::new("BTCUSDT", "alpha", 0.0001).with_prices(42000.5, 41990.25),
                Observation::new("BTCUSDT", "beta", 0.0003).with_prices(42001.0, 41992.0),
            ],
        )
        .unwrap();
    state
        .log()
        .append("ETHUSDT", &[Observation::new("ETHUSDT", "alpha", -0.0002)])
        .unwrap();
}

#[tokio::test]
async fn test_list_files_sorted_by_instrument() {
    let (app, state, _clock, _dir) = test_app();
    seed(&state);

    let (status, response) = get(app, "/api/logs").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 2);
    assert_eq!(response["log_files"][0]["instrument"], "BTCUSDT");
    assert_eq!(response["log_files"][0]["path"], "BTCUSDT/15-01-2024.log");
    assert_eq!(response["log_files"][1]["instrument"], "ETHUSDT");
}

#[tokio::test]
async fn test_symbol_log_decodes_blocks() {
    let (app, state, clock, _dir) = test_app();
    seed(&state);
    clock.set(Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap());
    state
        .log()
        .append("BTCUSDT", &[Observation::new("BTCUSDT", "alpha", 0.0004)])
        .unwrap();

    let (status, response) = get(app, "/api/logs/BTCUSDT?date=2024-01-15").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["symbol"], "BTCUSDT");
    assert_eq!(response["date"], "15-01-2024");
    assert_eq!(response["count"], 2);
    assert_eq!(response["entries"][0]["rates"].as_array().unwrap().len(), 2);
    assert_eq!(response["entries"][1]["timestamp"], "2024-01-15T09:00:00Z");
    assert_eq!(response["entries"][1]["rates"][0]["funding_rate"], 0.0004);
}

#[tokio::test]
async fn test_symbol_log_raw_text() {
    let (app, state, _clock, _dir) = test_app();
    seed(&state);

    let (status, content_type, body) = get_raw(app, "/api/logs/BTCUSDT?format=raw").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.is_some_and(|ct| ct.starts_with("text/plain")));
    let expected = "[2024-01-15 08:00:00] Symbol: BTCUSDT\n\
                    \x20 Exchange: alpha, Funding Rate: 0.000100, Mark Price: 42000.50, Index Price: 41990.25\n\
                    \x20 Exchange: beta, Funding Rate: 0.000300, Mark Price: 42001.00, Index Price: 41992.00\n\
                    \n";
    assert_eq!(String::from_utf8(body).unwrap(), expected);
}

#[tokio::test]
async fn test_symbol_log_missing_day_is_404() {
    let (app, state, _clock, _dir) = test_app();
    seed(&state);

    let (status, response) = get(app, "/api/logs/BTCUSDT?date=14-01-2024").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["error"], "log_not_found");
}

#[tokio::test]
async fn test_symbol_log_invalid_date_is_400() {
    let (app, _state, _clock, _dir) = test_app();

    let (status, response) = get(app, "/api/logs/BTCUSDT?date=yesterday").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "invalid_date");
}

#[tokio::test]
async fn test_symbol_path_traversal_is_400() {
    let (app, _state, _clock, _dir) = test_app();

    let (status, response) = get(app, "/api/logs/BTC%5CUSDT?date=15-01-2024").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "invalid_symbol");
}
