//! Append-only time-series log storage.
//!
//! This module provides the file-backed `TimeSeriesLog`, the `LogCodec`
//! seam between blocks and day-file content, and the day-name helpers used
//! to address day-files.

pub mod codec;
pub mod day;
pub mod parser;
pub mod time_series_log;

use std::io;
use thiserror::Error;

pub use codec::{JsonLinesCodec, LogCodec, LogFormat, TextCodec};
pub use day::{format_day, normalize_day, parse_day};
pub use time_series_log::TimeSeriesLog;

/// Errors that can occur during log store operations.
#[derive(Debug, Error)]
pub enum LogStoreError {
    /// Appending a block failed.
    #[error("Failed to write log for {instrument}: {source}")]
    WriteFailed {
        /// Instrument whose block could not be written.
        instrument: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The requested day-file does not exist.
    #[error("Log file not found for {instrument} on {day}")]
    FileNotFound {
        /// Requested instrument.
        instrument: String,
        /// Requested day, in `DD-MM-YYYY` form.
        day: String,
    },

    /// The day is in neither accepted form.
    #[error("Invalid date '{0}': expected YYYY-MM-DD or DD-MM-YYYY")]
    InvalidDay(String),

    /// The instrument cannot name a directory inside the log root.
    #[error("Invalid symbol '{0}'")]
    InvalidInstrument(String),

    /// Generic I/O error while reading or enumerating.
    #[error("Storage error: {0}")]
    Io(#[from] io::Error),
}
