//! Collection round configuration.
//!
//! Controls how often the scheduler runs a collection round and how long a
//! single data source may take to answer a fetch or a liveness probe.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default interval between collection rounds, in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Default per-source deadline, in seconds.
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 10;

/// Timing configuration for collection rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Seconds between two collection rounds.
    pub interval_secs: u64,
    /// Seconds a single source may take before it is counted as failed.
    pub source_timeout_secs: u64,
}

impl CollectionConfig {
    /// Creates a new collection configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use shared::config::CollectionConfig;
    ///
    /// let config = CollectionConfig::new(30, 5);
    /// assert_eq!(config.interval().as_secs(), 30);
    /// assert_eq!(config.source_timeout().as_secs(), 5);
    /// ```
    #[must_use]
    pub fn new(interval_secs: u64, source_timeout_secs: u64) -> Self {
        Self {
            interval_secs,
            source_timeout_secs,
        }
    }

    /// Returns the round interval as a `Duration`.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Returns the per-source deadline as a `Duration`.
    #[must_use]
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The interval is zero
    /// - The source timeout is zero
    pub fn validate(&self) -> Result<(), String> {
        if self.interval_secs == 0 {
            return Err("Collection interval must be greater than zero".to_string());
        }
        if self.source_timeout_secs == 0 {
            return Err("Source timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for CollectionConfig {
    /// Returns one round per minute with a ten second per-source deadline.
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL_SECS, DEFAULT_SOURCE_TIMEOUT_SECS)
    }
}
