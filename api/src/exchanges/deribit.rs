//! Deribit perpetuals adapter.
//!
//! Deribit has no bulk funding endpoint: the adapter lists active
//! instruments per settlement currency, then fetches one ticker per
//! perpetual concurrently.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shared::models::Observation;
use shared::source::{DataSource, SourceError};
use std::time::Duration;

use super::ExchangeClient;
use crate::config::ExchangeConfig;

/// Registration name.
pub const NAME: &str = "deribit";
/// Public REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://www.deribit.com";

const INSTRUMENTS_ENDPOINT: &str = "/api/v2/public/get_instruments";
const TICKER_ENDPOINT: &str = "/api/v2/public/ticker";
const CURRENCIES: [&str; 2] = ["USDC", "BTC"];
const FUNDING_INTERVAL_HOURS: i64 = 8;

/// JSON-RPC envelope.
#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    /// Payload on success.
    pub result: Option<T>,
    /// Error on failure.
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
pub struct RpcError {
    /// Error code.
    pub code: i64,
    /// Error description.
    #[serde(default)]
    pub message: String,
}

/// One listed instrument.
#[derive(Debug, Deserialize)]
pub struct Instrument {
    /// Instrument name, e.g. `BTC-PERPETUAL`.
    pub instrument_name: String,
    /// Whether the instrument is tradable.
    #[serde(default)]
    pub is_active: bool,
}

/// Ticker of one instrument.
#[derive(Debug, Deserialize)]
pub struct Ticker {
    /// Instrument name.
    pub instrument_name: String,
    /// Current funding rate.
    #[serde(default)]
    pub current_funding: f64,
    /// Funding over the last eight hours.
    #[serde(default)]
    pub funding_8h: f64,
    /// Mark price.
    #[serde(default)]
    pub mark_price: f64,
    /// Index price.
    #[serde(default)]
    pub index_price: f64,
    /// `"open"` while trading.
    #[serde(default)]
    pub state: String,
}

/// Deribit data source.
#[derive(Debug)]
pub struct Deribit {
    client: ExchangeClient,
}

impl Deribit {
    /// Creates the adapter. Deribit authenticates with OAuth, so a
    /// configured API key is not sent.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &ExchangeConfig, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: ExchangeClient::new(config, timeout, None)?,
        })
    }

    async fn rpc<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let response: RpcResponse<T> = self.client.get_json(endpoint, params).await?;
        rpc_result(response)
    }

    async fn ticker(&self, instrument: &str) -> Result<Ticker, SourceError> {
        self.rpc(TICKER_ENDPOINT, &[("instrument_name", instrument)])
            .await
    }
}

/// Extracts the result of a JSON-RPC response.
///
/// # Errors
///
/// Returns `SourceError::Api` when the response carries an error or no
/// result.
pub fn rpc_result<T>(response: RpcResponse<T>) -> Result<T, SourceError> {
    match (response.result, response.error) {
        (_, Some(error)) => Err(SourceError::Api(format!(
            "code {}: {}",
            error.code, error.message
        ))),
        (Some(result), None) => Ok(result),
        (None, None) => Err(SourceError::Api("empty result".to_string())),
    }
}

/// Returns the names of the active perpetual instruments.
#[must_use]
pub fn perpetual_names(instruments: Vec<Instrument>) -> Vec<String> {
    instruments
        .into_iter()
        .filter(|i| i.is_active && i.instrument_name.contains("PERPETUAL"))
        .map(|i| i.instrument_name)
        .collect()
}

/// Converts one ticker into an observation, or `None` when the instrument
/// is not trading or the rate is not finite.
///
/// Deribit funds continuously; the next funding is reported one interval
/// after `now`.
#[must_use]
pub fn normalize(ticker: Ticker, now: DateTime<Utc>) -> Option<Observation> {
    if ticker.state != "open" || !ticker.current_funding.is_finite() {
        return None;
    }
    Some(
        Observation::new(ticker.instrument_name, NAME, ticker.current_funding)
            .with_prices(ticker.mark_price, ticker.index_price)
            .with_last_funding_rate(ticker.funding_8h)
            .with_next_funding_time(now + TimeDelta::hours(FUNDING_INTERVAL_HOURS))
            .with_captured_at(now),
    )
}

#[async_trait]
impl DataSource for Deribit {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self) -> Result<Vec<Observation>, SourceError> {
        let mut names = Vec::new();
        for currency in CURRENCIES {
            let params = [("currency", currency), ("kind", "future"), ("expired", "false")];
            let instruments: Vec<Instrument> = self.rpc(INSTRUMENTS_ENDPOINT, &params).await?;
            names.extend(perpetual_names(instruments));
        }

        let tickers = join_all(names.iter().map(|name| self.ticker(name))).await;
        let now = Utc::now();
        let observations: Vec<Observation> = names
            .iter()
            .zip(tickers)
            .filter_map(|(name, ticker)| match ticker {
                Ok(ticker) => normalize(ticker, now),
                Err(e) => {
                    tracing::warn!(exchange = NAME, instrument = %name, error = %e, "Failed to fetch ticker");
                    None
                }
            })
            .collect();

        tracing::info!(exchange = NAME, count = observations.len(), "Retrieved funding rates");
        Ok(observations)
    }

    async fn is_healthy(&self) -> bool {
        self.client
            .probe(
                INSTRUMENTS_ENDPOINT,
                &[("currency", "USDC"), ("kind", "future"), ("expired", "false")],
            )
            .await
    }
}
