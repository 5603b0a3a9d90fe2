//! Bybit linear perpetuals adapter.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use shared::models::Observation;
use shared::source::{DataSource, SourceError};
use std::time::Duration;

use super::{parse_millis, parse_or_zero, parse_rate, ExchangeClient};
use crate::config::ExchangeConfig;

/// Registration name.
pub const NAME: &str = "bybit";
/// Public REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.bybit.com";

const ENDPOINT: &str = "/v5/market/tickers";
const PARAMS: [(&str, &str); 1] = [("category", "linear")];

/// Envelope of every v5 response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickersResponse {
    /// Zero on success.
    pub ret_code: i64,
    /// Error description when `ret_code` is non-zero.
    #[serde(default)]
    pub ret_msg: String,
    /// Payload.
    #[serde(default)]
    pub result: TickersResult,
}

/// Ticker list.
#[derive(Debug, Default, Deserialize)]
pub struct TickersResult {
    /// One entry per contract.
    #[serde(default)]
    pub list: Vec<Ticker>,
}

/// One linear contract ticker.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    /// Contract symbol.
    pub symbol: String,
    /// Current funding rate.
    #[serde(default)]
    pub funding_rate: String,
    /// Mark price.
    #[serde(default)]
    pub mark_price: String,
    /// Index price.
    #[serde(default)]
    pub index_price: String,
    /// Next funding time in epoch milliseconds.
    #[serde(default)]
    pub next_funding_time: String,
}

/// Bybit data source.
#[derive(Debug)]
pub struct Bybit {
    client: ExchangeClient,
}

impl Bybit {
    /// Creates the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &ExchangeConfig, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: ExchangeClient::new(config, timeout, Some("X-BAPI-API-KEY"))?,
        })
    }
}

/// Converts a tickers response into observations.
///
/// # Errors
///
/// Returns `SourceError::Api` when the envelope reports a failure.
pub fn normalize(response: TickersResponse) -> Result<Vec<Observation>, SourceError> {
    if response.ret_code != 0 {
        return Err(SourceError::Api(format!(
            "retCode {}: {}",
            response.ret_code, response.ret_msg
        )));
    }

    let now = Utc::now();
    Ok(response
        .result
        .list
        .into_iter()
        .filter(|ticker| !ticker.funding_rate.is_empty())
        .filter_map(|ticker| {
            let rate = parse_rate(NAME, &ticker.symbol, &ticker.funding_rate)?;
            let mark = parse_or_zero(NAME, &ticker.symbol, "mark_price", &ticker.mark_price);
            let index = parse_or_zero(NAME, &ticker.symbol, "index_price", &ticker.index_price);
            let next = parse_millis(NAME, &ticker.symbol, &ticker.next_funding_time);
            Some(
                Observation::new(ticker.symbol, NAME, rate)
                    .with_prices(mark, index)
                    .with_next_funding_time(next)
                    .with_captured_at(now),
            )
        })
        .collect())
}

#[async_trait]
impl DataSource for Bybit {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self) -> Result<Vec<Observation>, SourceError> {
        let response: TickersResponse = self.client.get_json(ENDPOINT, &PARAMS).await?;
        let observations = normalize(response)?;
        tracing::info!(exchange = NAME, count = observations.len(), "Retrieved funding rates");
        Ok(observations)
    }

    async fn is_healthy(&self) -> bool {
        self.client.probe(ENDPOINT, &PARAMS).await
    }
}
