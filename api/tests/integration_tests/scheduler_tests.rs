//! End-to-end: a collection round written by the scheduler is readable
//! through the HTTP API.

use api::{CollectionScheduler, RoundOutcome};
use axum::http::StatusCode;
use std::time::Duration;

use super::common::{get, test_app};

#[tokio::test]
async fn test_round_is_visible_through_api() {
    let (app, state, _clock, _dir) = test_app();
    let scheduler = CollectionScheduler::new(&state, Duration::from_secs(300));

    let RoundOutcome::Completed(summary) = scheduler.run_round().await else {
        panic!("round should not be skipped");
    };
    assert_eq!(summary.instruments, 2);
    assert_eq!(summary.observations, 3);
    assert_eq!(summary.failed_sources, vec!["gamma".to_string()]);
    assert!(summary.failed_writes.is_empty());

    let (status, response) = get(app.clone(), "/api/logs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 2);

    let (status, response) = get(app.clone(), "/api/logs/BTCUSDT").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["count"], 1);
    assert_eq!(response["entries"][0]["rates"].as_array().unwrap().len(), 2);

    let (status, response) = get(app, "/api/history/ETHUSDT?exchange=alpha").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response[0]["funding_rate"], -0.0002);
}
