//! Integration tests for history reconstruction across day-files.

use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use shared::models::Observation;

use super::common::{get, test_app};

#[tokio::test]
async fn test_history_spans_days_in_calendar_order() {
    let (app, state, clock, _dir) = test_app();
    for (day, hour, rate) in [(31, 23, 0.0001), (1, 0, 0.0002), (2, 8, 0.0003)] {
        let month = if day == 31 { 12 } else { 1 };
        let year = if day == 31 { 2023 } else { 2024 };
        clock.set(Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap());
        state
            .log()
            .append(
                "BTCUSDT",
                &[
                    Observation::new("BTCUSDT", "alpha", rate),
                    Observation::new("BTCUSDT", "beta", rate * 2.0),
                ],
            )
            .unwrap();
    }

    let (status, response) = get(app, "/api/history/BTCUSDT?exchange=alpha").await;

    assert_eq!(status, StatusCode::OK);
    let points = response.as_array().unwrap();
    assert_eq!(points.len(), 3);
    let timestamps: Vec<i64> = points
        .iter()
        .map(|p| p["timestamp"].as_i64().unwrap())
        .collect();
    assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(
        timestamps[0],
        Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap().timestamp()
    );
    assert_eq!(points[2]["funding_rate"], 0.0003);
}

#[tokio::test]
async fn test_history_for_absent_exchange_is_empty() {
    let (app, state, _clock, _dir) = test_app();
    state
        .log()
        .append("BTCUSDT", &[Observation::new("BTCUSDT", "alpha", 0.0001)])
        .unwrap();

    let (status, response) = get(app, "/api/history/BTCUSDT?exchange=beta").await;

    assert_eq!(status, StatusCode::OK);
    assert!(response.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_history_requires_exchange() {
    let (app, _state, _clock, _dir) = test_app();

    let (status, response) = get(app, "/api/history/BTCUSDT").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "missing_exchange");
}
