//! OKX perpetual swaps adapter.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use shared::models::Observation;
use shared::source::{DataSource, SourceError};
use std::time::Duration;

use super::{parse_millis, parse_or_zero, parse_rate, ExchangeClient};
use crate::config::ExchangeConfig;

/// Registration name.
pub const NAME: &str = "okx";
/// Public REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://www.okx.com";

const ENDPOINT: &str = "/api/v5/public/funding-rate";
const PARAMS: [(&str, &str); 1] = [("instType", "SWAP")];

/// Envelope of a v5 public response.
#[derive(Debug, Deserialize)]
pub struct FundingRateResponse {
    /// `"0"` on success.
    pub code: String,
    /// Error description.
    #[serde(default)]
    pub msg: String,
    /// Payload.
    #[serde(default)]
    pub data: Vec<FundingRateEntry>,
}

/// One instrument's funding rate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRateEntry {
    /// Instrument id, e.g. `BTC-USDT-SWAP`.
    pub inst_id: String,
    /// Current funding rate.
    #[serde(default)]
    pub funding_rate: String,
    /// Next funding time in epoch milliseconds.
    #[serde(default)]
    pub next_funding_time: String,
    /// Mark price.
    #[serde(default, rename = "markPx")]
    pub mark_px: String,
    /// Index price.
    #[serde(default, rename = "idxPx")]
    pub idx_px: String,
    /// Previous period's funding rate.
    #[serde(default)]
    pub last_funding_rate: String,
}

/// OKX data source.
#[derive(Debug)]
pub struct Okx {
    client: ExchangeClient,
}

impl Okx {
    /// Creates the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &ExchangeConfig, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: ExchangeClient::new(config, timeout, Some("OK-ACCESS-KEY"))?,
        })
    }
}

/// Converts a funding rate response into observations.
///
/// # Errors
///
/// Returns `SourceError::Api` when the envelope code is not `"0"`.
pub fn normalize(response: FundingRateResponse) -> Result<Vec<Observation>, SourceError> {
    if response.code != "0" {
        return Err(SourceError::Api(format!(
            "code {}: {}",
            response.code, response.msg
        )));
    }

    let now = Utc::now();
    Ok(response
        .data
        .into_iter()
        .filter_map(|entry| {
            let id = entry.inst_id;
            let rate = parse_rate(NAME, &id, &entry.funding_rate)?;
            let mark = parse_or_zero(NAME, &id, "mark_price", &entry.mark_px);
            let index = parse_or_zero(NAME, &id, "index_price", &entry.idx_px);
            let last = parse_or_zero(NAME, &id, "last_funding_rate", &entry.last_funding_rate);
            let next = parse_millis(NAME, &id, &entry.next_funding_time);
            Some(
                Observation::new(id, NAME, rate)
                    .with_prices(mark, index)
                    .with_last_funding_rate(last)
                    .with_next_funding_time(next)
                    .with_captured_at(now),
            )
        })
        .collect())
}

#[async_trait]
impl DataSource for Okx {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self) -> Result<Vec<Observation>, SourceError> {
        let response: FundingRateResponse = self.client.get_json(ENDPOINT, &PARAMS).await?;
        let observations = normalize(response)?;
        tracing::info!(exchange = NAME, count = observations.len(), "Retrieved funding rates");
        Ok(observations)
    }

    async fn is_healthy(&self) -> bool {
        self.client.probe(ENDPOINT, &PARAMS).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_funding_rates() {
        let json = r#"{
            "code": "0",
            "msg": "",
            "data": [
                {"instId":"BTC-USDT-SWAP","instType":"SWAP","fundingRate":"0.00012",
                 "nextFundingTime":"1704096000000","markPx":"43000.5","idxPx":"42990.1",
                 "lastFundingRate":"0.0001"},
                {"instId":"ETH-USDT-SWAP","instType":"SWAP","fundingRate":"oops",
                 "nextFundingTime":"1704096000000"}
            ]
        }"#;
        let response: FundingRateResponse = serde_json::from_str(json).unwrap();

        let observations = normalize(response).unwrap();

        assert_eq!(observations.len(), 1);
        let btc = &observations[0];
        assert_eq!(btc.instrument, "BTC-USDT-SWAP");
        assert_eq!(btc.funding_rate, 0.00012);
        assert_eq!(btc.last_funding_rate, 0.0001);
        assert_eq!(btc.mark_price, 43000.5);
    }

    #[test]
    fn test_normalize_error_code() {
        let json = r#"{"code": "50011", "msg": "Too Many Requests", "data": []}"#;
        let response: FundingRateResponse = serde_json::from_str(json).unwrap();

        assert!(matches!(normalize(response), Err(SourceError::Api(_))));
    }
}
