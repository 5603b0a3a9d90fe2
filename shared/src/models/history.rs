//! Models derived from the on-disk log: day-file descriptors, decoded blocks
//! and reconstructed history points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Observation;

/// A reconstructed funding rate at one capture instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Capture instant as Unix epoch seconds.
    pub timestamp: i64,
    /// Funding rate recorded at that instant.
    pub funding_rate: f64,
}

/// Metadata for one day-file, derived from directory enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFileDescriptor {
    /// Instrument the file belongs to.
    #[serde(rename = "symbol")]
    pub instrument: String,
    /// Day in the native `DD-MM-YYYY` form.
    #[serde(rename = "date")]
    pub day: String,
    /// Path relative to the log root.
    pub path: String,
    /// File size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

/// One provider line inside a log block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLine {
    /// Provider (exchange) name.
    pub exchange: String,
    /// Funding rate.
    pub funding_rate: f64,
    /// Mark price.
    pub mark_price: f64,
    /// Index price.
    pub index_price: f64,
}

impl From<&Observation> for RateLine {
    fn from(obs: &Observation) -> Self {
        Self {
            exchange: obs.provider.clone(),
            funding_rate: obs.funding_rate,
            mark_price: obs.mark_price,
            index_price: obs.index_price,
        }
    }
}

/// One timestamped block of a day-file: everything a single collection
/// round wrote for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogBlock {
    /// Capture instant of the round.
    pub timestamp: DateTime<Utc>,
    /// Instrument the block belongs to.
    #[serde(rename = "symbol")]
    pub instrument: String,
    /// Provider lines, in write order.
    pub rates: Vec<RateLine>,
}

impl LogBlock {
    /// Builds a block from the observations of one round.
    #[must_use]
    pub fn from_observations(
        timestamp: DateTime<Utc>,
        instrument: impl Into<String>,
        observations: &[Observation],
    ) -> Self {
        Self {
            timestamp,
            instrument: instrument.into(),
            rates: observations.iter().map(RateLine::from).collect(),
        }
    }

    /// Returns the history points this block contributes for `provider`.
    pub fn history_for<'a>(
        &'a self,
        provider: &'a str,
    ) -> impl Iterator<Item = HistoryPoint> + 'a {
        self.rates
            .iter()
            .filter(move |rate| rate.exchange == provider)
            .map(move |rate| HistoryPoint {
                timestamp: self.timestamp.timestamp(),
                funding_rate: rate.funding_rate,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_block_from_observations_keeps_order() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let observations = vec![
            Observation::new("BTCUSDT", "binance", 0.0001).with_prices(100.0, 99.0),
            Observation::new("BTCUSDT", "bybit", -0.0002),
        ];

        let block = LogBlock::from_observations(ts, "BTCUSDT", &observations);

        assert_eq!(block.rates.len(), 2);
        assert_eq!(block.rates[0].exchange, "binance");
        assert_eq!(block.rates[0].mark_price, 100.0);
        assert_eq!(block.rates[1].exchange, "bybit");
    }

    #[test]
    fn test_history_for_filters_provider() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let observations = vec![
            Observation::new("BTCUSDT", "binance", 0.0001),
            Observation::new("BTCUSDT", "bybit", -0.0002),
        ];
        let block = LogBlock::from_observations(ts, "BTCUSDT", &observations);

        let points: Vec<_> = block.history_for("bybit").collect();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].timestamp, ts.timestamp());
        assert_eq!(points[0].funding_rate, -0.0002);
    }
}
