//! Exchange adapters.
//!
//! Every adapter implements [`shared::source::DataSource`] over one
//! exchange's public REST API. Decoding the wire payload into
//! [`shared::models::Observation`]s is a pure `normalize` function per
//! adapter so it can be tested without the network.

pub mod binance;
pub mod bitget;
pub mod bybit;
pub mod deribit;
pub mod gate;
mod http;
pub mod kucoin;
pub mod mexc;
pub mod okx;
pub mod xt;

pub use http::ExchangeClient;

use chrono::{DateTime, Utc};
use shared::source::{DataSource, SourceError};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ExchangeConfig;

/// Names of the exchanges an adapter exists for.
pub const KNOWN_EXCHANGES: [&str; 9] = [
    binance::NAME,
    bybit::NAME,
    okx::NAME,
    mexc::NAME,
    bitget::NAME,
    gate::NAME,
    deribit::NAME,
    xt::NAME,
    kucoin::NAME,
];

/// Returns the public REST base URL of a known exchange.
#[must_use]
pub fn default_base_url(name: &str) -> Option<&'static str> {
    match name {
        binance::NAME => Some(binance::DEFAULT_BASE_URL),
        bybit::NAME => Some(bybit::DEFAULT_BASE_URL),
        okx::NAME => Some(okx::DEFAULT_BASE_URL),
        mexc::NAME => Some(mexc::DEFAULT_BASE_URL),
        bitget::NAME => Some(bitget::DEFAULT_BASE_URL),
        gate::NAME => Some(gate::DEFAULT_BASE_URL),
        deribit::NAME => Some(deribit::DEFAULT_BASE_URL),
        xt::NAME => Some(xt::DEFAULT_BASE_URL),
        kucoin::NAME => Some(kucoin::DEFAULT_BASE_URL),
        _ => None,
    }
}

/// Builds one data source per configured exchange.
///
/// Unknown names are skipped with a warning.
///
/// # Errors
///
/// Returns an error if an HTTP client cannot be created.
pub fn build_sources(
    configs: &[ExchangeConfig],
    timeout: Duration,
) -> Result<Vec<Arc<dyn DataSource>>, SourceError> {
    let mut sources: Vec<Arc<dyn DataSource>> = Vec::with_capacity(configs.len());

    for config in configs {
        let source: Arc<dyn DataSource> = match config.name.as_str() {
            binance::NAME => Arc::new(binance::Binance::new(config, timeout)?),
            bybit::NAME => Arc::new(bybit::Bybit::new(config, timeout)?),
            okx::NAME => Arc::new(okx::Okx::new(config, timeout)?),
            mexc::NAME => Arc::new(mexc::Mexc::new(config, timeout)?),
            bitget::NAME => Arc::new(bitget::Bitget::new(config, timeout)?),
            gate::NAME => Arc::new(gate::Gate::new(config, timeout)?),
            deribit::NAME => Arc::new(deribit::Deribit::new(config, timeout)?),
            xt::NAME => Arc::new(xt::Xt::new(config, timeout)?),
            kucoin::NAME => Arc::new(kucoin::KuCoin::new(config, timeout)?),
            other => {
                tracing::warn!(exchange = %other, "Unknown exchange, skipping");
                continue;
            }
        };
        tracing::info!(exchange = %config.name, base_url = %config.base_url, "Configured exchange");
        sources.push(source);
    }

    Ok(sources)
}

/// Parses a decimal the exchange sent as a string.
///
/// A funding rate that fails to parse, or parses to NaN or an infinity,
/// drops the whole record, so this returns `None` after logging.
pub(crate) fn parse_rate(exchange: &str, symbol: &str, raw: &str) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        Ok(value) => {
            tracing::warn!(exchange, symbol, value = raw, parsed = value, "Non-finite funding rate");
            None
        }
        Err(e) => {
            tracing::warn!(exchange, symbol, value = raw, error = %e, "Failed to parse funding rate");
            None
        }
    }
}

/// Parses an auxiliary decimal (price, previous rate), falling back to zero.
pub(crate) fn parse_or_zero(exchange: &str, symbol: &str, field: &str, raw: &str) -> f64 {
    if raw.trim().is_empty() {
        return 0.0;
    }
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        Ok(_) => {
            tracing::warn!(exchange, symbol, field, value = raw, "Non-finite field");
            0.0
        }
        Err(e) => {
            tracing::warn!(exchange, symbol, field, value = raw, error = %e, "Failed to parse field");
            0.0
        }
    }
}

/// Converts epoch milliseconds to a UTC instant, falling back to the epoch.
pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

/// Parses epoch milliseconds sent as a string.
pub(crate) fn parse_millis(exchange: &str, symbol: &str, raw: &str) -> DateTime<Utc> {
    match raw.trim().parse::<i64>() {
        Ok(millis) => from_millis(millis),
        Err(e) => {
            if !raw.trim().is_empty() {
                tracing::warn!(exchange, symbol, value = raw, error = %e, "Failed to parse next funding time");
            }
            DateTime::<Utc>::default()
        }
    }
}
