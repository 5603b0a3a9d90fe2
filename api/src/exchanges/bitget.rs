//! Bitget USDT-margined futures adapter.

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use serde::Deserialize;
use shared::models::Observation;
use shared::source::{DataSource, SourceError};
use std::time::Duration;

use super::{parse_or_zero, parse_rate, ExchangeClient};
use crate::config::ExchangeConfig;

/// Registration name.
pub const NAME: &str = "bitget";
/// Public REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.bitget.com";

const TICKERS_ENDPOINT: &str = "/api/mix/v1/market/tickers";
const CONTRACTS_ENDPOINT: &str = "/api/mix/v1/market/contracts";
const PARAMS: [(&str, &str); 1] = [("productType", "umcbl")];
const SUCCESS_CODE: &str = "00000";
const FUNDING_INTERVAL_HOURS: i64 = 8;

/// Envelope of a mix API response.
#[derive(Debug, Deserialize)]
pub struct TickersResponse {
    /// `"00000"` on success.
    pub code: String,
    /// Error description.
    #[serde(default)]
    pub msg: String,
    /// Payload.
    #[serde(default)]
    pub data: Vec<Ticker>,
}

/// One contract ticker.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    /// Contract symbol, e.g. `BTCUSDT_UMCBL`.
    pub symbol: String,
    /// Current funding rate.
    #[serde(default)]
    pub funding_rate: String,
    /// Index price.
    #[serde(default)]
    pub index_price: String,
}

/// Bitget data source.
#[derive(Debug)]
pub struct Bitget {
    client: ExchangeClient,
}

impl Bitget {
    /// Creates the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &ExchangeConfig, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: ExchangeClient::new(config, timeout, Some("ACCESS-KEY"))?,
        })
    }
}

/// Converts the bulk tickers response into observations.
///
/// The ticker carries no mark price or settlement time: the mark price stays
/// zero and the next funding is assumed one interval away.
///
/// # Errors
///
/// Returns `SourceError::Api` when the envelope reports a failure.
pub fn normalize(response: TickersResponse) -> Result<Vec<Observation>, SourceError> {
    if response.code != SUCCESS_CODE {
        return Err(SourceError::Api(format!(
            "code {}: {}",
            response.code, response.msg
        )));
    }

    let now = Utc::now();
    let next = now + TimeDelta::hours(FUNDING_INTERVAL_HOURS);
    Ok(response
        .data
        .into_iter()
        .filter(|ticker| !ticker.funding_rate.is_empty())
        .filter_map(|ticker| {
            let rate = parse_rate(NAME, &ticker.symbol, &ticker.funding_rate)?;
            let index = parse_or_zero(NAME, &ticker.symbol, "index_price", &ticker.index_price);
            Some(
                Observation::new(ticker.symbol, NAME, rate)
                    .with_prices(0.0, index)
                    .with_next_funding_time(next)
                    .with_captured_at(now),
            )
        })
        .collect())
}

#[async_trait]
impl DataSource for Bitget {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self) -> Result<Vec<Observation>, SourceError> {
        let response: TickersResponse = self.client.get_json(TICKERS_ENDPOINT, &PARAMS).await?;
        let observations = normalize(response)?;
        tracing::info!(exchange = NAME, count = observations.len(), "Retrieved funding rates");
        Ok(observations)
    }

    async fn is_healthy(&self) -> bool {
        self.client.probe(CONTRACTS_ENDPOINT, &PARAMS).await
    }
}
