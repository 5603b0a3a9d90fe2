//! Time source abstraction.
//!
//! The log store asks a `Clock` for "now" instead of calling `Utc::now()`
//! directly, so day-file selection and header timestamps can be pinned in
//! tests.

use chrono::{DateTime, Utc};
use std::sync::{PoisonError, RwLock};

/// A source of the current UTC time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that returns a settable instant.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use shared::clock::{Clock, FixedClock};
///
/// let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
/// clock.set(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
/// assert_eq!(clock.now().format("%d-%m-%Y").to_string(), "02-01-2024");
/// ```
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    /// Creates a clock fixed at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(PoisonError::into_inner) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }
}
