//! Minimal REST client shared by the exchange adapters.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::source::SourceError;
use std::time::Duration;

use crate::config::ExchangeConfig;

/// Issues public GET requests against one exchange's base URL.
#[derive(Debug, Clone)]
pub struct ExchangeClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    key_header: Option<&'static str>,
}

impl ExchangeClient {
    /// Creates a client for `config` whose requests give up after `timeout`.
    ///
    /// `key_header` names the header that carries the API key, when one is
    /// configured. Exchanges without key-header auth pass `None` and the key
    /// is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        config: &ExchangeConfig,
        timeout: Duration,
        key_header: Option<&'static str>,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fundingwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            key_header,
        })
    }

    /// Returns the base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, endpoint: &str, params: &[(&str, &str)]) -> RequestBuilder {
        let url = format!("{}{endpoint}", self.base_url);
        let mut request = self.client.get(url).query(params);
        if let (Some(header), Some(key)) = (self.key_header, &self.api_key) {
            request = request.header(header, key);
        }
        request
    }

    /// GETs `endpoint` and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The request cannot be sent or times out
    /// - The status is not 2xx
    /// - The body is not the expected JSON
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        tracing::debug!(base_url = %self.base_url, endpoint, "GET");

        let response = self
            .request(endpoint, params)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Http(format!("Failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))
    }

    /// Returns true when a GET on `endpoint` answers with a 2xx status.
    pub async fn probe(&self, endpoint: &str, params: &[(&str, &str)]) -> bool {
        match self.request(endpoint, params).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(base_url = %self.base_url, error = %e, "Health probe failed");
                false
            }
        }
    }
}
