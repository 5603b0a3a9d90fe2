//! Log file endpoints.
//!
//! Provides HTTP endpoints for browsing the time-series log.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::{LogBlock, LogFileDescriptor};
use shared::storage::normalize_day;

use super::error::ApiError;
use crate::state::AppState;

/// Response listing every day-file.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogFilesResponse {
    /// One descriptor per day-file.
    pub log_files: Vec<LogFileDescriptor>,
    /// Number of day-files.
    pub count: usize,
}

/// Response for one instrument's day-file.
#[derive(Debug, Serialize, Deserialize)]
pub struct SymbolLogResponse {
    /// Instrument.
    pub symbol: String,
    /// Day in `DD-MM-YYYY` form.
    pub date: String,
    /// When the response was produced.
    pub timestamp: DateTime<Utc>,
    /// Decoded blocks.
    pub entries: Vec<LogBlock>,
    /// Number of blocks.
    pub count: usize,
}

/// Query parameters for a single day-file.
#[derive(Debug, Default, Deserialize)]
pub struct SymbolLogQuery {
    /// `YYYY-MM-DD` or `DD-MM-YYYY`; today when absent.
    pub date: Option<String>,
    /// `raw` returns the file as text instead of decoded JSON.
    pub format: Option<String>,
}

/// Creates the log browsing routes.
pub fn logs_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/logs", get(list_log_files))
        .route("/api/logs/{symbol}", get(get_symbol_log))
        .with_state(state)
}

/// Handler for GET /api/logs.
async fn list_log_files(State(state): State<AppState>) -> Result<Json<LogFilesResponse>, ApiError> {
    let log_files = state.log().run_blocking(|log| log.enumerate()).await?;
    Ok(Json(LogFilesResponse {
        count: log_files.len(),
        log_files,
    }))
}

/// Handler for GET /api/logs/{symbol}.
///
/// Returns 400 on an unparsable date and 404 when the day-file is missing.
async fn get_symbol_log(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<SymbolLogQuery>,
) -> Result<Response, ApiError> {
    let date = match query.date.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(date) => normalize_day(date)?,
        None => state.log().today(),
    };

    if query.format.as_deref() == Some("raw") {
        let (name, day) = (symbol.clone(), date.clone());
        let raw = state
            .log()
            .run_blocking(move |log| log.read_raw(&name, &day))
            .await?;
        return Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            raw,
        )
            .into_response());
    }

    let (name, day) = (symbol.clone(), date.clone());
    let entries = state
        .log()
        .run_blocking(move |log| log.read_entries(&name, &day))
        .await?;
    tracing::debug!(symbol = %symbol, date = %date, entries = entries.len(), "Serving symbol log");

    Ok(Json(SymbolLogResponse {
        symbol,
        date,
        timestamp: state.clock().now(),
        count: entries.len(),
        entries,
    })
    .into_response())
}
