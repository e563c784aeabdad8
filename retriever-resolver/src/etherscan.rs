//! Etherscan client for verified source code.
//!
//! All requests share one token-bucket limiter, so the whole process stays
//! under the account's request budget no matter how many callers there are.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use retriever_core::constants::{
    DEFAULT_ETHERSCAN_URL, DEFAULT_TIMEOUT_SECONDS, ETHERSCAN_BURST, ETHERSCAN_REQUESTS_PER_SECOND,
};
use retriever_core::error::{Result, RetrieverError};
use retriever_core::traits::SourceCodeApi;
use retriever_core::types::{EtherscanResponse, SourceCode};

/// Etherscan client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EtherscanConfig {
    /// API endpoint
    pub base_url: String,
    /// Account API key
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Requests allowed in a burst
    pub burst: u32,
}

impl Default for EtherscanConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ETHERSCAN_URL.into(),
            api_key: String::new(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            requests_per_second: ETHERSCAN_REQUESTS_PER_SECOND,
            burst: ETHERSCAN_BURST,
        }
    }
}

impl EtherscanConfig {
    /// Creates a configuration for the public endpoint with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Points the client at another endpoint (other chains, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn quota(&self) -> Result<Quota> {
        let rate = NonZeroU32::new(self.requests_per_second).ok_or_else(|| {
            RetrieverError::ConfigError("requests_per_second must be greater than zero".into())
        })?;
        let burst = NonZeroU32::new(self.burst)
            .ok_or_else(|| RetrieverError::ConfigError("burst must be greater than zero".into()))?;
        Ok(Quota::per_second(rate).allow_burst(burst))
    }
}

/// Rate-limited client for the `getsourcecode` endpoint.
pub struct EtherscanClient {
    config: EtherscanConfig,
    http_client: reqwest::Client,
    limiter: DefaultDirectRateLimiter,
}

impl EtherscanClient {
    /// Creates a client for the public endpoint with the given key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(EtherscanConfig::new(api_key))
    }

    /// Creates a client with custom configuration.
    pub fn with_config(config: EtherscanConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RetrieverError::HttpError(e.to_string()))?;
        let limiter = RateLimiter::direct(config.quota()?);

        Ok(Self {
            config,
            http_client,
            limiter,
        })
    }

    /// Fetches the verified source record for `address`.
    ///
    /// Waits for a rate-limit permit before sending anything.
    #[instrument(skip(self))]
    pub async fn get_source_code(&self, address: &str) -> Result<SourceCode> {
        self.limiter.until_ready().await;

        let response = self
            .http_client
            .get(&self.config.base_url)
            .query(&[
                ("module", "contract"),
                ("action", "getsourcecode"),
                ("address", address),
                ("apikey", self.config.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| RetrieverError::HttpError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RetrieverError::HttpError(e.to_string()))?;

        if !status.is_success() {
            warn!(address, %status, "Source API returned non-success status");
        }

        let source = parse_source_response(&body)?;
        debug!(address, contract = %source.contract_name, "Fetched source record");
        Ok(source)
    }
}

#[async_trait]
impl SourceCodeApi for EtherscanClient {
    async fn fetch_source(&self, address: &str) -> Result<SourceCode> {
        self.get_source_code(address).await
    }
}

/// Interprets a raw `getsourcecode` response body.
///
/// - `result` is a string: the upstream error message
/// - `result` is an empty list: [`RetrieverError::NoResult`]
/// - `result` is a list: its first element is the record
/// - anything else: [`RetrieverError::UnknownResponse`] carrying the body
pub fn parse_source_response(body: &str) -> Result<SourceCode> {
    let response: EtherscanResponse = serde_json::from_str(body)?;

    match response.result {
        serde_json::Value::String(message) => Err(RetrieverError::Upstream(message)),
        serde_json::Value::Array(records) => {
            let first = records.into_iter().next().ok_or(RetrieverError::NoResult)?;
            Ok(serde_json::from_value(first)?)
        }
        _ => Err(RetrieverError::UnknownResponse(body.to_string())),
    }
}
