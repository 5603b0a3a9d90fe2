//! JSON error responses shared by all routes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::aggregator::AggregatorError;
use shared::storage::LogStoreError;

/// Error body returned by every route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error kind.
    pub error: String,
    /// Human-readable description.
    pub message: String,
}

/// An error that renders as a status code plus [`ErrorBody`].
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    /// Creates an error with an explicit status and kind.
    pub fn new(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.to_string(),
                message: message.into(),
            },
        }
    }

    /// 400 with the given kind.
    pub fn bad_request(error: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<AggregatorError> for ApiError {
    fn from(err: AggregatorError) -> Self {
        let (status, kind) = match &err {
            AggregatorError::SourceNotFound(_) => (StatusCode::NOT_FOUND, "exchange_not_found"),
            AggregatorError::SourceUnavailable { .. } => {
                (StatusCode::BAD_GATEWAY, "exchange_unavailable")
            }
        };
        Self::new(status, kind, err.to_string())
    }
}

impl From<LogStoreError> for ApiError {
    fn from(err: LogStoreError) -> Self {
        let (status, kind) = match &err {
            LogStoreError::FileNotFound { .. } => (StatusCode::NOT_FOUND, "log_not_found"),
            LogStoreError::InvalidDay(_) => (StatusCode::BAD_REQUEST, "invalid_date"),
            LogStoreError::InvalidInstrument(_) => (StatusCode::BAD_REQUEST, "invalid_symbol"),
            LogStoreError::WriteFailed { .. } | LogStoreError::Io(_) => {
                tracing::error!(error = %err, "Log store failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
            }
        };
        Self::new(status, kind, err.to_string())
    }
}
