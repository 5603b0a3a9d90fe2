//! Binance USD-M futures adapter.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use shared::models::Observation;
use shared::source::{DataSource, SourceError};
use std::time::Duration;

use super::{from_millis, parse_or_zero, parse_rate, ExchangeClient};
use crate::config::ExchangeConfig;

/// Registration name.
pub const NAME: &str = "binance";
/// Public REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

const ENDPOINT: &str = "/fapi/v1/premiumIndex";

/// One entry of the premium index response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumIndex {
    /// Contract symbol.
    pub symbol: String,
    /// Mark price.
    #[serde(default)]
    pub mark_price: String,
    /// Index price.
    #[serde(default)]
    pub index_price: String,
    /// Most recently applied funding rate.
    #[serde(default)]
    pub last_funding_rate: String,
    /// Next funding time in epoch milliseconds.
    #[serde(default)]
    pub next_funding_time: i64,
}

/// Binance data source.
#[derive(Debug)]
pub struct Binance {
    client: ExchangeClient,
}

impl Binance {
    /// Creates the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &ExchangeConfig, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: ExchangeClient::new(config, timeout, Some("X-MBX-APIKEY"))?,
        })
    }
}

/// Converts the premium index payload into observations.
#[must_use]
pub fn normalize(entries: Vec<PremiumIndex>) -> Vec<Observation> {
    let now = Utc::now();
    entries
        .into_iter()
        .filter_map(|entry| {
            let rate = parse_rate(NAME, &entry.symbol, &entry.last_funding_rate)?;
            let mark = parse_or_zero(NAME, &entry.symbol, "mark_price", &entry.mark_price);
            let index = parse_or_zero(NAME, &entry.symbol, "index_price", &entry.index_price);
            Some(
                Observation::new(entry.symbol, NAME, rate)
                    .with_prices(mark, index)
                    .with_last_funding_rate(rate)
                    .with_next_funding_time(from_millis(entry.next_funding_time))
                    .with_captured_at(now),
            )
        })
        .collect()
}

#[async_trait]
impl DataSource for Binance {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self) -> Result<Vec<Observation>, SourceError> {
        let entries: Vec<PremiumIndex> = self.client.get_json(ENDPOINT, &[]).await?;
        let observations = normalize(entries);
        tracing::info!(exchange = NAME, count = observations.len(), "Retrieved funding rates");
        Ok(observations)
    }

    async fn is_healthy(&self) -> bool {
        self.client.probe(ENDPOINT, &[("symbol", "BTCUSDT")]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"[
        {"symbol":"BTCUSDT","markPrice":"43000.50000000","indexPrice":"42990.10000000",
         "estimatedSettlePrice":"42995.0","lastFundingRate":"0.00010000","interestRate":"0.00010000",
         "nextFundingTime":1704096000000,"time":1704081600000},
        {"symbol":"ETHUSDT","markPrice":"2300.1","indexPrice":"","lastFundingRate":"-0.00005",
         "nextFundingTime":1704096000000},
        {"symbol":"BADUSDT","markPrice":"1","indexPrice":"1","lastFundingRate":"","nextFundingTime":0}
    ]"#;

    #[test]
    fn test_normalize_premium_index() {
        let entries: Vec<PremiumIndex> = serde_json::from_str(FIXTURE).unwrap();

        let observations = normalize(entries);

        assert_eq!(observations.len(), 2);
        let btc = &observations[0];
        assert_eq!(btc.instrument, "BTCUSDT");
        assert_eq!(btc.provider, "binance");
        assert_eq!(btc.funding_rate, 0.0001);
        assert_eq!(btc.mark_price, 43000.5);
        assert_eq!(btc.index_price, 42990.1);
        assert_eq!(btc.next_funding_time.timestamp(), 1_704_096_000);

        let eth = &observations[1];
        assert_eq!(eth.funding_rate, -0.00005);
        assert_eq!(eth.index_price, 0.0);
    }
}
