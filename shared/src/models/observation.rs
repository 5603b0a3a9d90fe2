//! Observation data model.
//!
//! Defines the `Observation` structure every data source normalizes its
//! upstream payload into before it reaches the aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// One provider's funding-rate reading for one instrument at one instant.
///
/// # Example
///
/// ```
/// use shared::models::Observation;
///
/// let obs = Observation::new("BTCUSDT", "binance", 0.0001)
///     .with_prices(43000.5, 42990.1);
///
/// assert!(obs.validate_observation().is_ok());
/// assert_eq!(obs.mark_price, 43000.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Observation {
    /// Instrument identifier, e.g. `BTCUSDT`.
    #[serde(rename = "symbol")]
    #[validate(length(min = 1, message = "Instrument cannot be empty"))]
    pub instrument: String,

    /// Provider (exchange) identifier.
    #[serde(rename = "exchange")]
    #[validate(length(min = 1, message = "Provider cannot be empty"))]
    pub provider: String,

    /// Current funding rate.
    pub funding_rate: f64,

    /// Mark price, zero when the provider does not supply it.
    #[serde(default)]
    pub mark_price: f64,

    /// Index price, zero when the provider does not supply it.
    #[serde(default)]
    pub index_price: f64,

    /// Funding rate of the previous period, zero when not supplied.
    #[serde(default)]
    pub last_funding_rate: f64,

    /// When the next funding event is expected.
    pub next_funding_time: DateTime<Utc>,

    /// When this observation was captured.
    #[serde(rename = "timestamp")]
    pub captured_at: DateTime<Utc>,
}

/// Errors that can occur during observation validation.
#[derive(Debug, Error)]
pub enum ObservationValidationError {
    /// The instrument identifier is empty.
    #[error("Instrument cannot be empty")]
    EmptyInstrument,

    /// The provider identifier is empty.
    #[error("Provider cannot be empty")]
    EmptyProvider,

    /// The funding rate is NaN or infinite.
    #[error("Funding rate must be finite, got {0}")]
    NonFiniteRate(f64),

    /// Validation failed with details.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

impl Observation {
    /// Creates an observation captured now, with no auxiliary prices.
    ///
    /// The next funding time defaults to the capture instant until set with
    /// [`Observation::with_next_funding_time`].
    #[must_use]
    pub fn new(
        instrument: impl Into<String>,
        provider: impl Into<String>,
        funding_rate: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            instrument: instrument.into(),
            provider: provider.into(),
            funding_rate,
            mark_price: 0.0,
            index_price: 0.0,
            last_funding_rate: 0.0,
            next_funding_time: now,
            captured_at: now,
        }
    }

    /// Sets the mark and index prices.
    #[must_use]
    pub fn with_prices(mut self, mark_price: f64, index_price: f64) -> Self {
        self.mark_price = mark_price;
        self.index_price = index_price;
        self
    }

    /// Sets the previous period's funding rate.
    #[must_use]
    pub fn with_last_funding_rate(mut self, last_funding_rate: f64) -> Self {
        self.last_funding_rate = last_funding_rate;
        self
    }

    /// Sets the next funding time.
    #[must_use]
    pub fn with_next_funding_time(mut self, next_funding_time: DateTime<Utc>) -> Self {
        self.next_funding_time = next_funding_time;
        self
    }

    /// Sets the capture instant.
    #[must_use]
    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = captured_at;
        self
    }

    /// Validates the observation.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The instrument is empty
    /// - The provider is empty
    /// - The funding rate is not finite
    pub fn validate_observation(&self) -> Result<(), ObservationValidationError> {
        if self.instrument.is_empty() {
            return Err(ObservationValidationError::EmptyInstrument);
        }
        if self.provider.is_empty() {
            return Err(ObservationValidationError::EmptyProvider);
        }
        if !self.funding_rate.is_finite() {
            return Err(ObservationValidationError::NonFiniteRate(self.funding_rate));
        }
        self.validate()?;
        Ok(())
    }
}
