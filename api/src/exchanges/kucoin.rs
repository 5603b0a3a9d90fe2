//! KuCoin futures adapter.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use shared::models::Observation;
use shared::source::{DataSource, SourceError};
use std::time::Duration;

use super::{from_millis, ExchangeClient};
use crate::config::ExchangeConfig;

/// Registration name.
pub const NAME: &str = "kucoin";
/// Public REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://api-futures.kucoin.com";

const ENDPOINT: &str = "/api/v1/contracts/active";
const SUCCESS_CODE: &str = "200000";

/// Envelope of a futures API response.
#[derive(Debug, Deserialize)]
pub struct ContractsResponse {
    /// `"200000"` on success.
    pub code: String,
    /// Error description.
    #[serde(default)]
    pub msg: Option<String>,
    /// Payload.
    #[serde(default)]
    pub data: Vec<Contract>,
}

/// One active contract. KuCoin sends numbers, and leaves them null on
/// contracts without funding.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    /// Contract symbol, e.g. `XBTUSDTM`.
    pub symbol: String,
    /// `"Open"` for tradable contracts.
    #[serde(default)]
    pub status: String,
    /// Current funding rate.
    #[serde(default)]
    pub funding_fee_rate: Option<f64>,
    /// Next funding time in epoch milliseconds.
    #[serde(default)]
    pub next_funding_rate_date_time: Option<i64>,
    /// Mark price.
    #[serde(default)]
    pub mark_price: Option<f64>,
    /// Index price.
    #[serde(default)]
    pub index_price: Option<f64>,
}

/// KuCoin data source.
#[derive(Debug)]
pub struct KuCoin {
    client: ExchangeClient,
}

impl KuCoin {
    /// Creates the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &ExchangeConfig, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: ExchangeClient::new(config, timeout, Some("KC-API-KEY"))?,
        })
    }
}

/// Converts the active contracts list into observations, keeping open
/// contracts that carry a funding rate.
///
/// # Errors
///
/// Returns `SourceError::Api` when the envelope reports a failure.
pub fn normalize(response: ContractsResponse) -> Result<Vec<Observation>, SourceError> {
    if response.code != SUCCESS_CODE {
        return Err(SourceError::Api(format!(
            "code {}: {}",
            response.code,
            response.msg.unwrap_or_default()
        )));
    }

    let now = Utc::now();
    Ok(response
        .data
        .into_iter()
        .filter(|contract| contract.status == "Open")
        .filter_map(|contract| {
            let rate = contract.funding_fee_rate.filter(|r| r.is_finite())?;
            let next = contract
                .next_funding_rate_date_time
                .map_or(now, from_millis);
            Some(
                Observation::new(contract.symbol, NAME, rate)
                    .with_prices(
                        contract.mark_price.unwrap_or_default(),
                        contract.index_price.unwrap_or_default(),
                    )
                    .with_next_funding_time(next)
                    .with_captured_at(now),
            )
        })
        .collect())
}

#[async_trait]
impl DataSource for KuCoin {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self) -> Result<Vec<Observation>, SourceError> {
        let response: ContractsResponse = self.client.get_json(ENDPOINT, &[]).await?;
        let observations = normalize(response)?;
        tracing::info!(exchange = NAME, count = observations.len(), "Retrieved funding rates");
        Ok(observations)
    }

    async fn is_healthy(&self) -> bool {
        self.client.probe(ENDPOINT, &[]).await
    }
}
