//! XT.com futures adapter.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use shared::models::Observation;
use shared::source::{DataSource, SourceError};
use std::time::Duration;

use super::{from_millis, parse_rate, ExchangeClient};
use crate::config::ExchangeConfig;

/// Registration name.
pub const NAME: &str = "xt";
/// Public REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.xt.com";

const ENDPOINT: &str = "/v4/public/funding-rate";

/// Envelope of a public API response.
#[derive(Debug, Deserialize)]
pub struct FundingRateResponse {
    /// Zero on success.
    pub code: i64,
    /// Error description.
    #[serde(default)]
    pub message: String,
    /// Payload.
    #[serde(default)]
    pub data: Vec<FundingRateEntry>,
}

/// One contract's funding rate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRateEntry {
    /// Contract symbol, e.g. `btc_usdt`.
    pub symbol: String,
    /// Current funding rate.
    #[serde(default)]
    pub funding_rate: String,
    /// Next funding time in epoch milliseconds.
    #[serde(default)]
    pub next_funding_time: i64,
}

/// XT data source.
#[derive(Debug)]
pub struct Xt {
    client: ExchangeClient,
}

impl Xt {
    /// Creates the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &ExchangeConfig, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: ExchangeClient::new(config, timeout, Some("validate-appkey"))?,
        })
    }
}

/// Converts a funding rate response into observations. No prices.
///
/// # Errors
///
/// Returns `SourceError::Api` when the envelope reports a failure.
pub fn normalize(response: FundingRateResponse) -> Result<Vec<Observation>, SourceError> {
    if response.code != 0 {
        return Err(SourceError::Api(format!(
            "code {}: {}",
            response.code, response.message
        )));
    }

    let now = Utc::now();
    Ok(response
        .data
        .into_iter()
        .filter_map(|entry| {
            let rate = parse_rate(NAME, &entry.symbol, &entry.funding_rate)?;
            Some(
                Observation::new(entry.symbol, NAME, rate)
                    .with_next_funding_time(from_millis(entry.next_funding_time))
                    .with_captured_at(now),
            )
        })
        .collect())
}

#[async_trait]
impl DataSource for Xt {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self) -> Result<Vec<Observation>, SourceError> {
        let response: FundingRateResponse = self.client.get_json(ENDPOINT, &[]).await?;
        let observations = normalize(response)?;
        tracing::info!(exchange = NAME, count = observations.len(), "Retrieved funding rates");
        Ok(observations)
    }

    async fn is_healthy(&self) -> bool {
        self.client.probe(ENDPOINT, &[]).await
    }
}
