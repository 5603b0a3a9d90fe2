//! Day and path helpers for the log directory layout.
//!
//! Day-files are named `<DD-MM-YYYY>.log` inside one directory per
//! instrument. Callers may address a day either in that native form or as
//! `YYYY-MM-DD`.

use chrono::NaiveDate;

use super::LogStoreError;

/// Native day format used in file names.
pub const DAY_FORMAT: &str = "%d-%m-%Y";

/// Calendar day format accepted from callers.
pub const ISO_DAY_FORMAT: &str = "%Y-%m-%d";

/// Extension of every day-file.
pub const DAY_FILE_EXTENSION: &str = "log";

/// Formats a date in the native `DD-MM-YYYY` form.
#[must_use]
pub fn format_day(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

/// Parses a day given as `DD-MM-YYYY` or `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns `LogStoreError::InvalidDay` if the string matches neither form
/// or names a date that does not exist.
///
/// # Examples
///
/// ```
/// use shared::storage::day::parse_day;
///
/// assert_eq!(parse_day("2024-01-15").unwrap(), parse_day("15-01-2024").unwrap());
/// assert!(parse_day("2024/01/15").is_err());
/// ```
pub fn parse_day(day: &str) -> Result<NaiveDate, LogStoreError> {
    let day = day.trim();
    NaiveDate::parse_from_str(day, DAY_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(day, ISO_DAY_FORMAT))
        .map_err(|_| LogStoreError::InvalidDay(day.to_string()))
}

/// Normalizes a caller-supplied day to the native `DD-MM-YYYY` form.
///
/// # Errors
///
/// Returns `LogStoreError::InvalidDay` if the day cannot be parsed.
pub fn normalize_day(day: &str) -> Result<String, LogStoreError> {
    parse_day(day).map(format_day)
}

/// Returns the file name of the day-file for `date`.
#[must_use]
pub fn day_file_name(date: NaiveDate) -> String {
    format!("{}.{DAY_FILE_EXTENSION}", format_day(date))
}

/// Rejects instrument names that cannot be a single directory component.
pub(crate) fn validate_instrument(instrument: &str) -> Result<(), LogStoreError> {
    let invalid = instrument.is_empty()
        || instrument == "."
        || instrument == ".."
        || instrument.contains(['/', '\\', '\0']);
    if invalid {
        return Err(LogStoreError::InvalidInstrument(instrument.to_string()));
    }
    Ok(())
}
