//! JSON-RPC client for deployed bytecode.
//!
//! Answers two questions about an address: does it hold code, and what is
//! the SHA-256 of that code.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use retriever_core::constants::{DEFAULT_TIMEOUT_SECONDS, EMPTY_CODE};
use retriever_core::error::{Result, RetrieverError};
use retriever_core::traits::ContractInspector;

/// RPC client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Ethereum RPC URL
    pub rpc_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl RpcConfig {
    /// Creates a new configuration with the given RPC URL.
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Ethereum JSON-RPC client.
pub struct RpcClient {
    config: RpcConfig,
    http_client: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Creates a client for the given RPC URL.
    pub fn new(rpc_url: impl Into<String>) -> Result<Self> {
        Self::with_config(RpcConfig::new(rpc_url))
    }

    /// Creates a client with custom configuration.
    pub fn with_config(config: RpcConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RetrieverError::HttpError(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Returns the `eth_getCode` result at the latest block.
    #[instrument(skip(self))]
    pub async fn get_code(&self, address: &str) -> Result<String> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_getCode",
            "params": [address, "latest"],
            "id": self.next_id.fetch_add(1, Ordering::Relaxed)
        });

        let response: RpcResponse = self
            .http_client
            .post(&self.config.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RetrieverError::HttpError(e.to_string()))?
            .json()
            .await
            .map_err(|e| RetrieverError::HttpError(e.to_string()))?;

        if let Some(error) = response.error {
            warn!(address, error = %error, "eth_getCode failed");
            return Err(RetrieverError::RpcError(error.to_string()));
        }

        response
            .result
            .ok_or_else(|| RetrieverError::RpcError("response has no result".into()))
    }
}

#[async_trait]
impl ContractInspector for RpcClient {
    async fn is_contract(&self, address: &str) -> Result<bool> {
        let code = self.get_code(address).await?;
        Ok(has_code(&code))
    }

    async fn code_hash(&self, address: &str) -> Result<String> {
        let code = self.get_code(address).await?;
        if !has_code(&code) {
            return Err(RetrieverError::NotAContract(address.to_string()));
        }

        let hash = hash_code(&code);
        debug!(address, hash, "Hashed deployed code");
        Ok(hash)
    }
}

fn has_code(code: &str) -> bool {
    !code.is_empty() && code != EMPTY_CODE
}

/// `0x` + hex SHA-256 over the hex string exactly as the node returned it.
fn hash_code(code: &str) -> String {
    let digest = Sha256::digest(code.as_bytes());
    format!("0x{}", hex::encode(digest))
}
