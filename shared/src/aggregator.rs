//! Fan-out collection across registered data sources.
//!
//! The `Aggregator` holds a name → source mapping, queries every source
//! concurrently with a per-source deadline, and isolates each source's
//! failure from the others.

use futures_util::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;

use crate::config::DEFAULT_SOURCE_TIMEOUT_SECS;
use crate::models::{Observation, ProviderStatus};
use crate::source::{DataSource, SourceError};

/// Errors surfaced by caller-addressed aggregator operations.
#[derive(Debug, Error)]
pub enum AggregatorError {
    /// No source is registered under the requested name.
    #[error("Exchange not found: {0}")]
    SourceNotFound(String),

    /// The requested source failed or timed out.
    #[error("Exchange {name} unavailable: {error}")]
    SourceUnavailable {
        /// Name of the failing source.
        name: String,
        /// What went wrong.
        error: SourceError,
    },
}

/// One source's failure during a collection round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    /// Name of the failing source.
    pub name: String,
    /// What went wrong.
    pub error: SourceError,
}

/// Result of fanning out to every registered source.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Observations from every source that succeeded.
    pub observations: Vec<Observation>,
    /// Sources that failed or timed out.
    pub failures: Vec<SourceFailure>,
}

impl Collection {
    /// Groups the observations by instrument, in instrument order.
    #[must_use]
    pub fn by_instrument(self) -> BTreeMap<String, Vec<Observation>> {
        let mut grouped: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
        for obs in self.observations {
            grouped.entry(obs.instrument.clone()).or_default().push(obs);
        }
        grouped
    }
}

/// Collects observations from a dynamically registered set of sources.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use shared::aggregator::Aggregator;
/// use shared::models::Observation;
/// use shared::source::{SourceError, StaticSource};
///
/// # tokio_test::block_on(async {
/// let aggregator = Aggregator::new(Duration::from_secs(10));
/// aggregator.register_source(Arc::new(StaticSource::new(
///     "alpha",
///     vec![Observation::new("BTCUSDT", "alpha", 0.0001)],
/// )));
/// aggregator.register_source(Arc::new(StaticSource::failing(
///     "beta",
///     SourceError::Http("connection refused".to_string()),
/// )));
///
/// let collection = aggregator.collect_all().await;
/// assert_eq!(collection.observations.len(), 1);
/// assert_eq!(collection.failures.len(), 1);
/// # });
/// ```
pub struct Aggregator {
    sources: RwLock<HashMap<String, Arc<dyn DataSource>>>,
    source_timeout: Duration,
}

impl Aggregator {
    /// Creates an aggregator with no sources and the given per-source
    /// deadline.
    #[must_use]
    pub fn new(source_timeout: Duration) -> Self {
        Self {
            sources: RwLock::new(HashMap::new()),
            source_timeout,
        }
    }

    /// Creates an aggregator pre-populated with `sources`.
    #[must_use]
    pub fn with_sources(
        sources: impl IntoIterator<Item = Arc<dyn DataSource>>,
        source_timeout: Duration,
    ) -> Self {
        let aggregator = Self::new(source_timeout);
        for source in sources {
            aggregator.register_source(source);
        }
        aggregator
    }

    /// Registers a source under its own name. A later registration with the
    /// same name replaces the earlier one.
    pub fn register_source(&self, source: Arc<dyn DataSource>) {
        let name = source.name().to_string();
        let mut sources = self.sources.write().unwrap_or_else(PoisonError::into_inner);
        if sources.insert(name.clone(), source).is_some() {
            tracing::warn!(source = %name, "Replaced previously registered source");
        } else {
            tracing::info!(source = %name, "Registered source");
        }
    }

    /// Returns the registered source names in sorted order.
    #[must_use]
    pub fn source_names(&self) -> Vec<String> {
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = sources.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the per-source deadline.
    #[must_use]
    pub fn source_timeout(&self) -> Duration {
        self.source_timeout
    }

    /// Fetches from every registered source concurrently.
    ///
    /// A source that errors, times out or panics contributes no
    /// observations and is listed in [`Collection::failures`]; the call
    /// itself never fails, even when every source is down.
    pub async fn collect_all(&self) -> Collection {
        let sources = self.snapshot();
        let timeout = self.source_timeout;

        let handles = sources.iter().map(|(name, source)| {
            let source = Arc::clone(source);
            let name = name.clone();
            tokio::spawn(async move { fetch_with_timeout(&name, source.as_ref(), timeout).await })
        });
        let results = join_all(handles).await;

        let mut collection = Collection::default();
        for ((name, _), joined) in sources.into_iter().zip(results) {
            let outcome = joined.unwrap_or_else(|e| Err(SourceError::Http(format!("task failed: {e}"))));
            match outcome {
                Ok(observations) => {
                    tracing::debug!(source = %name, count = observations.len(), "Collected observations");
                    collection.observations.extend(observations);
                }
                Err(error) => {
                    tracing::warn!(source = %name, error = %error, "Source failed, continuing without it");
                    collection.failures.push(SourceFailure { name, error });
                }
            }
        }

        collection
    }

    /// Fetches from exactly one source.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No source is registered under `name`
    /// - The source fails or exceeds its deadline
    pub async fn collect_one(&self, name: &str) -> Result<Vec<Observation>, AggregatorError> {
        let source = {
            let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
            sources
                .get(name)
                .cloned()
                .ok_or_else(|| AggregatorError::SourceNotFound(name.to_string()))?
        };

        fetch_with_timeout(name, source.as_ref(), self.source_timeout)
            .await
            .map_err(|error| AggregatorError::SourceUnavailable {
                name: name.to_string(),
                error,
            })
    }

    /// Probes every registered source concurrently.
    ///
    /// A probe that exceeds the per-source deadline reports the source as
    /// unhealthy without delaying the others.
    pub async fn status(&self) -> BTreeMap<String, ProviderStatus> {
        let sources = self.snapshot();
        let timeout = self.source_timeout;

        let probes = sources.iter().map(|(name, source)| {
            let source = Arc::clone(source);
            let name = name.clone();
            tokio::spawn(async move {
                match tokio::time::timeout(timeout, source.is_healthy()).await {
                    Ok(healthy) => ProviderStatus::new(source.name(), healthy),
                    Err(_) => {
                        tracing::warn!(source = %name, ?timeout, "Liveness probe timed out");
                        ProviderStatus::new(source.name(), false)
                    }
                }
            })
        });
        let results = join_all(probes).await;

        sources
            .into_iter()
            .zip(results)
            .map(|((name, _), joined)| {
                let status = joined.unwrap_or_else(|_| ProviderStatus::new(name.clone(), false));
                (name, status)
            })
            .collect()
    }

    fn snapshot(&self) -> Vec<(String, Arc<dyn DataSource>)> {
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
        sources
            .iter()
            .map(|(name, source)| (name.clone(), Arc::clone(source)))
            .collect()
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_SOURCE_TIMEOUT_SECS))
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("sources", &self.source_names())
            .field("source_timeout", &self.source_timeout)
            .finish()
    }
}

async fn fetch_with_timeout(
    name: &str,
    source: &dyn DataSource,
    timeout: Duration,
) -> Result<Vec<Observation>, SourceError> {
    let observations = tokio::time::timeout(timeout, source.fetch())
        .await
        .map_err(|_| SourceError::Timeout(timeout))??;
    Ok(normalize(name, observations))
}

/// Stamps every observation with the source's registered name and drops
/// the ones that fail validation.
fn normalize(name: &str, observations: Vec<Observation>) -> Vec<Observation> {
    observations
        .into_iter()
        .filter_map(|mut obs| {
            if obs.provider != name {
                obs.provider = name.to_string();
            }
            match obs.validate_observation() {
                Ok(()) => Some(obs),
                Err(e) => {
                    tracing::debug!(source = %name, instrument = %obs.instrument, error = %e, "Dropping invalid observation");
                    None
                }
            }
        })
        .collect()
}
