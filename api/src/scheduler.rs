//! Periodic collection rounds.
//!
//! Each round collects from every source, groups the observations by
//! instrument and appends one block per instrument to the log.

use shared::aggregator::Aggregator;
use shared::storage::TimeSeriesLog;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};

use crate::state::AppState;

/// What one completed round did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundSummary {
    /// Instruments a block was written for.
    pub instruments: usize,
    /// Observations collected across all sources.
    pub observations: usize,
    /// Sources that failed or timed out.
    pub failed_sources: Vec<String>,
    /// Instruments whose block could not be written.
    pub failed_writes: Vec<String>,
}

/// Result of asking for a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The round ran to completion.
    Completed(RoundSummary),
    /// Another round was still in progress, so this one did nothing.
    Skipped,
}

/// Background scheduler for collection rounds.
pub struct CollectionScheduler {
    aggregator: Arc<Aggregator>,
    log: Arc<TimeSeriesLog>,
    interval_duration: Duration,
    busy: Mutex<()>,
}

impl CollectionScheduler {
    /// Creates a new scheduler.
    ///
    /// # Arguments
    ///
    /// * `state` - Application state holding the aggregator and the log
    /// * `interval_duration` - Time between round starts
    #[must_use]
    pub fn new(state: &AppState, interval_duration: Duration) -> Self {
        Self {
            aggregator: Arc::clone(state.aggregator()),
            log: Arc::clone(state.log()),
            interval_duration,
            busy: Mutex::new(()),
        }
    }

    /// Runs a single round unless one is already in progress.
    ///
    /// Source failures and write failures are logged and reported in the
    /// summary; they never stop the round.
    pub async fn run_round(&self) -> RoundOutcome {
        let Ok(_guard) = self.busy.try_lock() else {
            tracing::warn!("Collection round still in progress, skipping");
            return RoundOutcome::Skipped;
        };

        let collection = self.aggregator.collect_all().await;
        let mut summary = RoundSummary {
            observations: collection.observations.len(),
            failed_sources: collection.failures.iter().map(|f| f.name.clone()).collect(),
            ..RoundSummary::default()
        };

        for (instrument, observations) in collection.by_instrument() {
            let name = instrument.clone();
            let written = self
                .log
                .run_blocking(move |log| log.append(&name, &observations))
                .await;
            match written {
                Ok(()) => summary.instruments += 1,
                Err(e) => {
                    tracing::error!(instrument = %instrument, error = %e, "Failed to write log block");
                    summary.failed_writes.push(instrument);
                }
            }
        }

        tracing::info!(
            instruments = summary.instruments,
            observations = summary.observations,
            failed_sources = summary.failed_sources.len(),
            failed_writes = summary.failed_writes.len(),
            "Collection round complete"
        );

        RoundOutcome::Completed(summary)
    }

    /// Starts the collection loop.
    ///
    /// The first round starts immediately. A round that overruns the
    /// interval delays the next one instead of letting ticks pile up.
    ///
    /// # Cancellation
    ///
    /// This function runs until cancelled via the task handle.
    pub async fn run(self: Arc<Self>) {
        let mut tick = interval(self.interval_duration);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(interval = ?self.interval_duration, "Collection scheduler started");

        loop {
            tick.tick().await;
            self.run_round().await;
        }
    }
}
