//! Application state module.
//!
//! Defines the shared application state that is passed to route handlers.

use shared::aggregator::Aggregator;
use shared::clock::{Clock, SystemClock};
use shared::storage::{TextCodec, TimeSeriesLog};
use std::path::PathBuf;
use std::sync::Arc;

/// Application state shared across all request handlers.
///
/// Holds the aggregator used for live views, the time-series log used for
/// historical views, and the clock both agree on.
#[derive(Clone)]
pub struct AppState {
    aggregator: Arc<Aggregator>,
    log: Arc<TimeSeriesLog>,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(aggregator: Arc<Aggregator>, log: Arc<TimeSeriesLog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            aggregator,
            log,
            clock,
        }
    }

    /// Creates a state with no sources and a text log under `log_dir`.
    ///
    /// This is useful for development and testing.
    #[must_use]
    pub fn with_log_dir(log_dir: impl Into<PathBuf>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            aggregator: Arc::new(Aggregator::default()),
            log: Arc::new(TimeSeriesLog::new(log_dir, clock.clone(), Arc::new(TextCodec))),
            clock,
        }
    }

    /// Returns the aggregator.
    #[must_use]
    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    /// Returns the time-series log.
    #[must_use]
    pub fn log(&self) -> &Arc<TimeSeriesLog> {
        &self.log
    }

    /// Returns the clock.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Observation;
    use shared::source::StaticSource;

    #[test]
    fn test_app_state_is_clone() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::with_log_dir(dir.path());
        let state2 = state.clone();

        // Both should share the same aggregator
        state.aggregator().register_source(Arc::new(StaticSource::new(
            "alpha",
            vec![Observation::new("BTCUSDT", "alpha", 0.0001)],
        )));

        assert_eq!(state2.aggregator().source_names(), vec!["alpha".to_string()]);
        assert_eq!(state2.log().root(), dir.path());
    }
}
