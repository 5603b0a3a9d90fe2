//! Data source abstraction.
//!
//! A `DataSource` is one provider adapter: it fetches the provider's current
//! funding rates, normalizes them into [`Observation`]s, names itself and
//! answers a liveness probe. The aggregator only ever sees this trait.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;

use crate::models::Observation;

/// Errors a data source can report from a fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The request could not be sent or the connection failed.
    #[error("Request failed: {0}")]
    Http(String),

    /// The provider answered with a non-success HTTP status.
    #[error("API request failed with status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The provider reported an application-level error.
    #[error("Provider error: {0}")]
    Api(String),

    /// The source did not answer within its deadline.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// Trait for provider adapters.
///
/// Implementations must be thread-safe (Send + Sync); the aggregator calls
/// them from spawned tasks.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Returns the provider name used for registration and in the log.
    fn name(&self) -> &str;

    /// Fetches the provider's current observations.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be reached or its response
    /// cannot be normalized.
    async fn fetch(&self) -> Result<Vec<Observation>, SourceError>;

    /// Probes the provider. Must not mutate any state.
    async fn is_healthy(&self) -> bool;
}

/// A data source that serves a fixed set of observations.
///
/// Useful for development, demos and tests. It can be switched into a
/// failing mode, in which both the fetch and the liveness probe fail, and it
/// can be slowed down to exercise deadlines.
///
/// # Example
///
/// ```
/// use shared::models::Observation;
/// use shared::source::{DataSource, StaticSource};
///
/// # tokio_test::block_on(async {
/// let source = StaticSource::new("alpha", vec![Observation::new("BTCUSDT", "alpha", 0.0001)]);
/// assert_eq!(source.fetch().await.unwrap().len(), 1);
/// assert!(source.is_healthy().await);
/// # });
/// ```
#[derive(Debug)]
pub struct StaticSource {
    name: String,
    observations: Vec<Observation>,
    failure: Option<SourceError>,
    delay: Option<Duration>,
    healthy: AtomicBool,
}

impl StaticSource {
    /// Creates a healthy source that returns `observations`.
    #[must_use]
    pub fn new(name: impl Into<String>, observations: Vec<Observation>) -> Self {
        Self {
            name: name.into(),
            observations,
            failure: None,
            delay: None,
            healthy: AtomicBool::new(true),
        }
    }

    /// Creates a source whose fetch fails with `error` and whose probe fails.
    #[must_use]
    pub fn failing(name: impl Into<String>, error: SourceError) -> Self {
        Self {
            name: name.into(),
            observations: Vec::new(),
            failure: Some(error),
            delay: None,
            healthy: AtomicBool::new(false),
        }
    }

    /// Delays every fetch and probe by `delay`.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Overrides the liveness probe result.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    async fn wait(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl DataSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<Observation>, SourceError> {
        self.wait().await;
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.observations.clone()),
        }
    }

    async fn is_healthy(&self) -> bool {
        self.wait().await;
        self.healthy.load(Ordering::SeqCst)
    }
}
