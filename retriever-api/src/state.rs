//! App state: resolver, cache, config.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use retriever_cache::{CacheConfig, TtlCache};
use retriever_core::constants::CACHE_SWEEP_INTERVAL;
use retriever_core::error::{Result, RetrieverError};
use retriever_core::traits::SourceStore;
use retriever_resolver::{
    EtherscanClient, EtherscanConfig, ResolverConfig, RpcClient, RpcConfig, SourceResolver,
};
use retriever_store::{LibsqlStore, MemoryStore};

/// Everything needed to wire up the service.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Source API client settings (holds the API key)
    pub etherscan: EtherscanConfig,
    /// JSON-RPC client settings
    pub rpc: RpcConfig,
    /// Database URL or path; `None` keeps rows in memory
    pub dsn: Option<String>,
    /// Auth token for a remote database
    pub auth_token: Option<String>,
    /// Read-through policy
    pub resolver: ResolverConfig,
    /// Cache background loops
    pub cache: CacheConfig,
}

impl ApiConfig {
    /// Creates a config with the required credentials and defaults elsewhere.
    pub fn new(api_key: impl Into<String>, rpc_url: impl Into<String>) -> Self {
        Self {
            etherscan: EtherscanConfig::new(api_key),
            rpc: RpcConfig::new(rpc_url),
            dsn: None,
            auth_token: None,
            resolver: ResolverConfig::default(),
            cache: CacheConfig::new(CACHE_SWEEP_INTERVAL),
        }
    }

    /// Sets the database location.
    pub fn with_dsn(mut self, dsn: impl Into<String>, auth_token: Option<String>) -> Self {
        self.dsn = Some(dsn.into());
        self.auth_token = auth_token;
        self
    }

    /// Checks the required settings are present.
    pub fn validate(&self) -> Result<()> {
        if self.etherscan.api_key.trim().is_empty() {
            return Err(RetrieverError::ConfigError("Etherscan API key is required".into()));
        }
        if self.rpc.rpc_url.trim().is_empty() {
            return Err(RetrieverError::ConfigError("Ethereum RPC URL is required".into()));
        }
        Ok(())
    }
}

/// Shared handler state.
pub struct AppState {
    /// Read-through resolver (owns the cache)
    pub resolver: SourceResolver,
    /// Process start, for uptime
    pub started_at: Instant,
}

impl AppState {
    /// Wraps an already-built resolver.
    pub fn new(resolver: SourceResolver) -> Self {
        Self {
            resolver,
            started_at: Instant::now(),
        }
    }

    /// Builds clients, store and cache from `config`.
    ///
    /// Must be called inside a tokio runtime (the cache spawns its loops).
    pub async fn from_config(config: &ApiConfig) -> Result<Self> {
        config.validate()?;

        let source_api = Arc::new(EtherscanClient::with_config(config.etherscan.clone())?);
        let inspector = Arc::new(RpcClient::with_config(config.rpc.clone())?);

        let store: Arc<dyn SourceStore> = match &config.dsn {
            Some(dsn) => Arc::new(LibsqlStore::connect(dsn, config.auth_token.as_deref()).await?),
            None => {
                warn!("No database configured, rows will be kept in memory only");
                Arc::new(MemoryStore::new())
            }
        };

        let cache = Arc::new(TtlCache::with_config(config.cache.clone()));
        info!(
            cache_ttl_secs = config.resolver.cache_ttl.as_secs(),
            sweep_interval_secs = config.cache.sweep_interval.as_secs(),
            "Source cache ready"
        );

        let resolver = SourceResolver::new(
            source_api,
            inspector,
            store,
            cache,
            config.resolver.clone(),
        );

        Ok(Self::new(resolver))
    }

    /// Stops the cache's background loops.
    pub async fn shutdown(&self) {
        self.resolver.cache().shutdown().await;
    }
}
