//! MEXC contract adapter.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use shared::models::Observation;
use shared::source::{DataSource, SourceError};
use std::time::Duration;

use super::{from_millis, ExchangeClient};
use crate::config::ExchangeConfig;

/// Registration name.
pub const NAME: &str = "mexc";
/// Public REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.mexc.com";

const ENDPOINT: &str = "/api/v1/contract/funding_rate";

/// Envelope of a contract API response.
#[derive(Debug, Deserialize)]
pub struct FundingRateResponse {
    /// True on success.
    pub success: bool,
    /// Zero on success.
    #[serde(default)]
    pub code: i64,
    /// Error description.
    #[serde(default)]
    pub msg: Option<String>,
    /// Payload.
    #[serde(default)]
    pub data: Vec<FundingRateEntry>,
}

/// One contract's funding rate. MEXC sends numbers, not strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRateEntry {
    /// Contract symbol, e.g. `BTC_USDT`.
    pub symbol: String,
    /// Current funding rate.
    pub funding_rate: f64,
    /// Next settlement in epoch milliseconds.
    #[serde(default)]
    pub next_settle_time: i64,
}

/// MEXC data source.
#[derive(Debug)]
pub struct Mexc {
    client: ExchangeClient,
}

impl Mexc {
    /// Creates the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &ExchangeConfig, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: ExchangeClient::new(config, timeout, Some("ApiKey"))?,
        })
    }
}

/// Converts a funding rate response into observations. MEXC supplies no
/// mark or index price, so both stay zero.
///
/// # Errors
///
/// Returns `SourceError::Api` when the envelope reports a failure.
pub fn normalize(response: FundingRateResponse) -> Result<Vec<Observation>, SourceError> {
    if !response.success || response.code != 0 {
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
        .filter(|entry| entry.funding_rate.is_finite())
        .map(|entry| {
            Observation::new(entry.symbol, NAME, entry.funding_rate)
                .with_next_funding_time(from_millis(entry.next_settle_time))
                .with_captured_at(now)
        })
        .collect())
}

#[async_trait]
impl DataSource for Mexc {
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
