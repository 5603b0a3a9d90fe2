//! Gate USDT-settled futures adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::models::Observation;
use shared::source::{DataSource, SourceError};
use std::time::Duration;

use super::{parse_or_zero, parse_rate, ExchangeClient};
use crate::config::ExchangeConfig;

/// Registration name.
pub const NAME: &str = "gate";
/// Public REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.gateio.ws";

const ENDPOINT: &str = "/api/v4/futures/usdt/contracts";

/// One futures contract.
#[derive(Debug, Deserialize)]
pub struct Contract {
    /// Contract name, e.g. `BTC_USDT`.
    pub name: String,
    /// Current funding rate.
    #[serde(default)]
    pub funding_rate: String,
    /// Next funding time in epoch seconds.
    #[serde(default)]
    pub funding_next_apply: i64,
    /// Mark price.
    #[serde(default)]
    pub mark_price: String,
    /// Index price.
    #[serde(default)]
    pub index_price: String,
    /// Trading status, `"trading"` for live contracts.
    #[serde(default)]
    pub status: String,
}

/// Gate data source.
#[derive(Debug)]
pub struct Gate {
    client: ExchangeClient,
}

impl Gate {
    /// Creates the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &ExchangeConfig, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: ExchangeClient::new(config, timeout, Some("KEY"))?,
        })
    }
}

/// Converts the contract list into observations, skipping contracts that
/// are not trading or carry no funding rate.
#[must_use]
pub fn normalize(contracts: Vec<Contract>) -> Vec<Observation> {
    let now = Utc::now();
    contracts
        .into_iter()
        .filter(|c| c.status == "trading" && !c.funding_rate.is_empty())
        .filter_map(|c| {
            let rate = parse_rate(NAME, &c.name, &c.funding_rate)?;
            let mark = parse_or_zero(NAME, &c.name, "mark_price", &c.mark_price);
            let index = parse_or_zero(NAME, &c.name, "index_price", &c.index_price);
            let next = DateTime::from_timestamp(c.funding_next_apply, 0).unwrap_or_default();
            Some(
                Observation::new(c.name, NAME, rate)
                    .with_prices(mark, index)
                    .with_next_funding_time(next)
                    .with_captured_at(now),
            )
        })
        .collect()
}

#[async_trait]
impl DataSource for Gate {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self) -> Result<Vec<Observation>, SourceError> {
        let contracts: Vec<Contract> = self.client.get_json(ENDPOINT, &[]).await?;
        let observations = normalize(contracts);
        tracing::info!(exchange = NAME, count = observations.len(), "Retrieved funding rates");
        Ok(observations)
    }

    async fn is_healthy(&self) -> bool {
        self.client.probe(ENDPOINT, &[("limit", "1")]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_contracts() {
        let json = r#"[
            {"name":"BTC_USDT","funding_rate":"0.0001","funding_next_apply":1704096000,
             "mark_price":"43000.5","index_price":"42990.1","status":"trading"},
            {"name":"OLD_USDT","funding_rate":"0.0002","funding_next_apply":1704096000,
             "mark_price":"1","index_price":"1","status":"delisting"},
            {"name":"NEW_USDT","funding_rate":"","funding_next_apply":0,"status":"trading"}
        ]"#;
        let contracts: Vec<Contract> = serde_json::from_str(json).unwrap();

        let observations = normalize(contracts);

        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].instrument, "BTC_USDT");
        assert_eq!(observations[0].provider, "gate");
        assert_eq!(observations[0].next_funding_time.timestamp(), 1_704_096_000);
    }
}
