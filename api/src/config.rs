//! Server configuration module.
//!
//! Handles loading configuration from environment variables with sensible defaults.

use shared::config::CollectionConfig;
use shared::storage::LogFormat;
use std::path::PathBuf;
use thiserror::Error;

use crate::exchanges::{default_base_url, KNOWN_EXCHANGES};

/// Default directory of the time-series log.
pub const DEFAULT_LOG_DIR: &str = "funding_logs";

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set to a value that cannot be used.
    #[error("Invalid value '{value}' for {var}: {reason}")]
    InvalidValue {
        /// Environment variable name.
        var: String,
        /// Offending value.
        value: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An exchange has no default base URL and none was configured.
    #[error("No base URL configured for exchange '{0}'")]
    MissingBaseUrl(String),
}

/// Connection settings for one exchange adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Adapter name, e.g. `binance`.
    pub name: String,
    /// REST base URL.
    pub base_url: String,
    /// Optional API key sent in the exchange's key header.
    pub api_key: Option<String>,
}

impl ExchangeConfig {
    /// Creates an exchange configuration without an API key.
    #[must_use]
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: None,
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Server configuration.
///
/// Configuration values can be set via environment variables:
/// - `FUNDINGWATCH_HOST`: The host address to bind to (default: "0.0.0.0")
/// - `FUNDINGWATCH_PORT`: The port to listen on (default: 8080)
/// - `FUNDINGWATCH_LOG_DIR`: Root of the time-series log (default: `funding_logs`)
/// - `FUNDINGWATCH_LOG_FORMAT`: `text` or `jsonl` (default: `text`)
/// - `FUNDINGWATCH_COLLECT_INTERVAL_SECS`: Seconds between rounds (default: 60)
/// - `FUNDINGWATCH_SOURCE_TIMEOUT_SECS`: Per-exchange deadline (default: 10)
/// - `FUNDINGWATCH_EXCHANGES`: Comma separated adapter names (default: all)
/// - `FUNDINGWATCH_<NAME>_BASE_URL` / `FUNDINGWATCH_<NAME>_API_KEY`: Per-exchange overrides
/// - `FUNDINGWATCH_STATIC_DIR`: Optional directory served as a fallback
#[derive(Debug, Clone)]
pub struct Config {
    /// The host address to bind to.
    pub host: String,
    /// The port to listen on.
    pub port: u16,
    /// Root directory of the time-series log.
    pub log_dir: PathBuf,
    /// Day-file encoding.
    pub log_format: LogFormat,
    /// Round interval and per-source deadline.
    pub collection: CollectionConfig,
    /// Enabled exchanges.
    pub exchanges: Vec<ExchangeConfig>,
    /// Directory of static assets, if any.
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A numeric variable cannot be parsed
    /// - The log format is unknown
    /// - The collection timing is invalid
    /// - An unknown exchange is enabled without a base URL
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = lookup("FUNDINGWATCH_HOST").unwrap_or(defaults.host);
        let port = parse_var(&lookup, "FUNDINGWATCH_PORT")?.unwrap_or(defaults.port);
        let log_dir = lookup("FUNDINGWATCH_LOG_DIR").map_or(defaults.log_dir, PathBuf::from);

        let log_format = match lookup("FUNDINGWATCH_LOG_FORMAT") {
            Some(value) => value.parse().map_err(|reason| ConfigError::InvalidValue {
                var: "FUNDINGWATCH_LOG_FORMAT".to_string(),
                value,
                reason,
            })?,
            None => defaults.log_format,
        };

        let collection = CollectionConfig::new(
            parse_var(&lookup, "FUNDINGWATCH_COLLECT_INTERVAL_SECS")?
                .unwrap_or(defaults.collection.interval_secs),
            parse_var(&lookup, "FUNDINGWATCH_SOURCE_TIMEOUT_SECS")?
                .unwrap_or(defaults.collection.source_timeout_secs),
        );
        collection
            .validate()
            .map_err(|reason| ConfigError::InvalidValue {
                var: "FUNDINGWATCH_COLLECT_INTERVAL_SECS/FUNDINGWATCH_SOURCE_TIMEOUT_SECS".to_string(),
                value: format!("{}/{}", collection.interval_secs, collection.source_timeout_secs),
                reason,
            })?;

        let names: Vec<String> = match lookup("FUNDINGWATCH_EXCHANGES") {
            Some(list) => list
                .split(',')
                .map(|name| name.trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect(),
            None => KNOWN_EXCHANGES.iter().map(ToString::to_string).collect(),
        };

        let mut exchanges = Vec::with_capacity(names.len());
        for name in names {
            let prefix = format!("FUNDINGWATCH_{}", name.to_uppercase());
            let base_url = lookup(&format!("{prefix}_BASE_URL"))
                .or_else(|| default_base_url(&name).map(ToString::to_string))
                .ok_or_else(|| ConfigError::MissingBaseUrl(name.clone()))?;
            let api_key = lookup(&format!("{prefix}_API_KEY")).filter(|k| !k.is_empty());
            exchanges.push(ExchangeConfig {
                name,
                base_url,
                api_key,
            });
        }

        let static_dir = lookup("FUNDINGWATCH_STATIC_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            host,
            port,
            log_dir,
            log_format,
            collection,
            exchanges,
            static_dir,
        })
    }

    /// Returns the `host:port` address to bind.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            log_format: LogFormat::default(),
            collection: CollectionConfig::default(),
            exchanges: KNOWN_EXCHANGES
                .iter()
                .filter_map(|name| default_base_url(name).map(|url| ExchangeConfig::new(*name, url)))
                .collect(),
            static_dir: None,
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidValue {
                    var: var.to_string(),
                    value: value.clone(),
                    reason: e.to_string(),
                })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_dir, PathBuf::from("funding_logs"));
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.collection, CollectionConfig::default());
        assert_eq!(config.exchanges.len(), 9);
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("FUNDINGWATCH_PORT", "3000"),
            ("FUNDINGWATCH_LOG_DIR", "/var/lib/fundingwatch"),
            ("FUNDINGWATCH_LOG_FORMAT", "jsonl"),
            ("FUNDINGWATCH_COLLECT_INTERVAL_SECS", "30"),
            ("FUNDINGWATCH_EXCHANGES", "binance, OKX"),
            ("FUNDINGWATCH_OKX_BASE_URL", "http://localhost:9000"),
            ("FUNDINGWATCH_BINANCE_API_KEY", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.log_format, LogFormat::JsonLines);
        assert_eq!(config.collection.interval_secs, 30);
        assert_eq!(config.exchanges.len(), 2);
        assert_eq!(config.exchanges[0].api_key.as_deref(), Some("secret"));
        assert_eq!(config.exchanges[1].name, "okx");
        assert_eq!(config.exchanges[1].base_url, "http://localhost:9000");
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup_from(&[("FUNDINGWATCH_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var, .. } if var == "FUNDINGWATCH_PORT"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = Config::from_lookup(lookup_from(&[("FUNDINGWATCH_COLLECT_INTERVAL_SECS", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_exchange_without_url() {
        let err = Config::from_lookup(lookup_from(&[("FUNDINGWATCH_EXCHANGES", "kraken")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingBaseUrl(name) if name == "kraken"));
    }
}
