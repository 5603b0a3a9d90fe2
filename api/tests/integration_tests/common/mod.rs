//! Common test utilities and helpers for integration tests.
//!
//! This module provides shared functionality used across all integration tests,
//! including test app setup and HTTP request helpers.

use api::{create_router, AppState};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use shared::aggregator::Aggregator;
use shared::clock::{Clock, FixedClock};
use shared::models::Observation;
use shared::source::{DataSource, SourceError, StaticSource};
use shared::storage::{TextCodec, TimeSeriesLog};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Instant every test app's clock starts at.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap()
}

/// Two healthy exchanges and one that refuses connections.
pub fn default_sources() -> Vec<StaticSource> {
    vec![
        StaticSource::new(
            "alpha",
            vec![
                Observation::new("BTCUSDT", "alpha", 0.0001).with_prices(42000.5, 41990.25),
                Observation::new("ETHUSDT", "alpha", -0.0002).with_prices(2500.0, 2499.0),
            ],
        ),
        StaticSource::new(
            "beta",
            vec![Observation::new("BTCUSDT", "beta", 0.0003).with_prices(42001.0, 41992.0)],
        ),
        StaticSource::failing("gamma", SourceError::Http("connection refused".to_string())),
    ]
}

/// Creates a test router over the given exchanges and a fresh log directory.
///
/// # Returns
///
/// The router, its state, the pinned clock and the directory guard. Dropping
/// the guard deletes the log.
pub fn test_app_with(sources: Vec<StaticSource>) -> (Router, AppState, Arc<FixedClock>, TempDir) {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(FixedClock::new(test_now()));
    let aggregator = Aggregator::with_sources(
        sources
            .into_iter()
            .map(|s| Arc::new(s) as Arc<dyn DataSource>),
        Duration::from_secs(1),
    );
    let log = TimeSeriesLog::new(dir.path(), clock.clone() as Arc<dyn Clock>, Arc::new(TextCodec));
    let state = AppState::new(Arc::new(aggregator), Arc::new(log), clock.clone());
    let router = create_router(state.clone());
    (router, state, clock, dir)
}

/// Creates a test router over [`default_sources`].
pub fn test_app() -> (Router, AppState, Arc<FixedClock>, TempDir) {
    test_app_with(default_sources())
}

/// Helper to make a GET request and parse the JSON body.
///
/// A body that is not JSON comes back as `Value::Null`.
pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = get_raw(app, uri).await;
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

/// Helper to make a GET request and keep the body as bytes.
pub async fn get_raw(app: Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, content_type, body_bytes.to_vec())
}
