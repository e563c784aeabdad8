//! Read-through source resolver.
//!
//! Lookup order for an address:
//! 1. the in-memory TTL cache
//! 2. the persistent store, if the row is younger than the freshness window
//! 3. the upstream source API, following proxies to their implementation
//!
//! Anything found in steps 2 or 3 is written back to the cache.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use retriever_cache::TtlCache;
use retriever_core::constants::{MAX_PROXY_DEPTH, SOURCE_CACHE_TTL, STORE_FRESHNESS};
use retriever_core::error::{Result, RetrieverError};
use retriever_core::traits::{ContractInspector, SourceCodeApi, SourceStore};
use retriever_core::types::SourceCode;

/// Resolver configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// How long a resolved record stays in the cache
    pub cache_ttl: Duration,
    /// How old a stored row may be before it is fetched again
    pub store_freshness: Duration,
    /// Maximum number of proxy hops to follow
    pub max_proxy_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_ttl: SOURCE_CACHE_TTL,
            store_freshness: STORE_FRESHNESS,
            max_proxy_depth: MAX_PROXY_DEPTH,
        }
    }
}

/// Where a resolved record came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrigin {
    /// In-memory TTL cache
    Cache,
    /// Persistent store, within the freshness window
    Store,
    /// Fetched from the source API just now
    Upstream,
}

/// Result of a resolution with metadata.
#[derive(Clone, Debug)]
pub struct ResolveResult {
    /// The source record
    pub source: Arc<SourceCode>,
    /// Which layer answered
    pub origin: SourceOrigin,
    /// Address the record belongs to (the implementation, for proxies)
    pub resolved_address: String,
}

/// Cache, then store, then upstream.
pub struct SourceResolver {
    source_api: Arc<dyn SourceCodeApi>,
    inspector: Arc<dyn ContractInspector>,
    store: Arc<dyn SourceStore>,
    cache: Arc<TtlCache<SourceCode>>,
    config: ResolverConfig,
}

impl SourceResolver {
    /// Creates a resolver over the given collaborators.
    pub fn new(
        source_api: Arc<dyn SourceCodeApi>,
        inspector: Arc<dyn ContractInspector>,
        store: Arc<dyn SourceStore>,
        cache: Arc<TtlCache<SourceCode>>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            source_api,
            inspector,
            store,
            cache,
            config,
        }
    }

    /// Resolves the verified source for `address`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let source = resolver.resolve("0xdAC17F958D2ee523a2206206994597C13D831ec7").await?;
    /// println!("{}", source.contract_name);
    /// ```
    pub async fn resolve(&self, address: &str) -> Result<Arc<SourceCode>> {
        Ok(self.resolve_full(address).await?.source)
    }

    /// Like [`resolve`](Self::resolve), but also reports where the record came from.
    #[instrument(skip(self))]
    pub async fn resolve_full(&self, address: &str) -> Result<ResolveResult> {
        self.resolve_inner(address, 0).await
    }

    /// Returns true if code is deployed at `address`.
    #[instrument(skip(self))]
    pub async fn is_contract(&self, address: &str) -> Result<bool> {
        self.inspector.is_contract(address).await
    }

    /// The cache in front of the store.
    pub fn cache(&self) -> &Arc<TtlCache<SourceCode>> {
        &self.cache
    }

    /// Read-through policy in effect.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn resolve_inner<'a>(&'a self, address: &'a str, depth: usize) -> BoxFuture<'a, Result<ResolveResult>> {
        async move {
            if let Some(source) = self.cache.get(address) {
                debug!(address, "Cache hit");
                return Ok(ResolveResult {
                    source,
                    origin: SourceOrigin::Cache,
                    resolved_address: address.to_string(),
                });
            }

            let now = Utc::now();
            if let Some(record) = self.store.get(address).await? {
                if let Some(remaining) = record.remaining_freshness_at(now, self.config.store_freshness) {
                    debug!(address, "Store hit");
                    let source = Arc::new(record.source_code);
                    // never outlive the row's own freshness
                    self.cache
                        .set(address, Arc::clone(&source), remaining.min(self.config.cache_ttl));
                    return Ok(ResolveResult {
                        source,
                        origin: SourceOrigin::Store,
                        resolved_address: address.to_string(),
                    });
                }
                debug!(address, age_secs = record.age_at(now).as_secs(), "Stored row is stale");
            }

            self.fetch_and_store(address, depth).await
        }
        .boxed()
    }

    async fn fetch_and_store(&self, address: &str, depth: usize) -> Result<ResolveResult> {
        let source = self.source_api.fetch_source(address).await?;

        if let Some(implementation) = source.proxy_target() {
            if depth >= self.config.max_proxy_depth {
                return Err(RetrieverError::ProxyDepthExceeded {
                    address: address.to_string(),
                    max_depth: self.config.max_proxy_depth,
                });
            }

            info!(address, implementation, "Following proxy");
            let implementation = implementation.to_string();
            let resolved = self.resolve_inner(&implementation, depth + 1).await?;
            self.cache
                .set(address, Arc::clone(&resolved.source), self.config.cache_ttl);
            return Ok(resolved);
        }

        let binary_hash = self.inspector.code_hash(address).await?;
        let source = Arc::new(source);

        self.cache
            .set(address, Arc::clone(&source), self.config.cache_ttl);
        self.store.upsert(address, &source, &binary_hash).await?;

        info!(address, contract = %source.contract_name, "Stored source from upstream");
        Ok(ResolveResult {
            source,
            origin: SourceOrigin::Upstream,
            resolved_address: address.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use retriever_core::constants::CACHE_SWEEP_INTERVAL;
    use retriever_core::types::ContractRecord;
    use retriever_store::MemoryStore;

    fn addr(n: u8) -> String {
        format!("0x{:040x}", n)
    }

    fn contract(name: &str) -> SourceCode {
        SourceCode {
            contract_name: name.into(),
            source_code: format!("contract {name} {{}}"),
            proxy: "0".into(),
            ..Default::default()
        }
    }

    fn proxy_to(implementation: &str) -> SourceCode {
        SourceCode {
            contract_name: "Proxy".into(),
            proxy: "1".into(),
            implementation: implementation.into(),
            ..Default::default()
        }
    }

    #[derive(Default)]
    struct FakeApi {
        records: HashMap<String, SourceCode>,
        calls: AtomicUsize,
    }

    impl FakeApi {
        fn with(mut self, address: &str, source: SourceCode) -> Self {
            self.records.insert(address.to_string(), source);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SourceCodeApi for FakeApi {
        async fn fetch_source(&self, address: &str) -> Result<SourceCode> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.records
                .get(address)
                .cloned()
                .ok_or_else(|| RetrieverError::Upstream("Contract source code not verified".into()))
        }
    }

    struct FakeInspector;

    #[async_trait]
    impl ContractInspector for FakeInspector {
        async fn is_contract(&self, address: &str) -> Result<bool> {
            Ok(address != addr(0))
        }

        async fn code_hash(&self, address: &str) -> Result<String> {
            if address == addr(0) {
                return Err(RetrieverError::NotAContract(address.to_string()));
            }
            Ok(format!("0x{}", "ab".repeat(32)))
        }
    }

    struct Harness {
        api: Arc<FakeApi>,
        store: Arc<MemoryStore>,
        resolver: SourceResolver,
    }

    fn harness(api: FakeApi, store: MemoryStore) -> Harness {
        let api = Arc::new(api);
        let store = Arc::new(store);
        let resolver = SourceResolver::new(
            api.clone(),
            Arc::new(FakeInspector),
            store.clone(),
            Arc::new(TtlCache::new(CACHE_SWEEP_INTERVAL)),
            ResolverConfig::default(),
        );
        Harness { api, store, resolver }
    }

    fn stored(address: &str, name: &str, age: ChronoDuration) -> ContractRecord {
        let updated_at = Utc::now() - age;
        ContractRecord {
            address: address.to_string(),
            contract_name: name.into(),
            source_code: contract(name),
            binary_hash: format!("0x{}", "cd".repeat(32)),
            created_at: updated_at - ChronoDuration::days(100),
            updated_at,
        }
    }

    #[tokio::test]
    async fn test_upstream_then_cache_hit() {
        let h = harness(FakeApi::default().with(&addr(1), contract("Token")), MemoryStore::new());

        let first = h.resolver.resolve_full(&addr(1)).await.unwrap();
        assert_eq!(first.origin, SourceOrigin::Upstream);
        assert_eq!(first.source.contract_name, "Token");

        let row = h.store.get(&addr(1)).await.unwrap().unwrap();
        assert_eq!(row.contract_name, "Token");
        assert_eq!(row.binary_hash, format!("0x{}", "ab".repeat(32)));

        let second = h.resolver.resolve_full(&addr(1)).await.unwrap();
        assert_eq!(second.origin, SourceOrigin::Cache);
        assert!(Arc::ptr_eq(&first.source, &second.source));
        assert_eq!(h.api.calls(), 1);
    }

    #[tokio::test]
    async fn test_fresh_store_row_is_served_and_cached() {
        let store = MemoryStore::new();
        store.insert_record(stored(&addr(2), "Stored", ChronoDuration::days(1)));
        let h = harness(FakeApi::default(), store);

        let result = h.resolver.resolve_full(&addr(2)).await.unwrap();
        assert_eq!(result.origin, SourceOrigin::Store);
        assert_eq!(result.source.contract_name, "Stored");
        assert_eq!(h.api.calls(), 0);

        assert!(h.resolver.cache().get(&addr(2)).is_some());
        let again = h.resolver.resolve_full(&addr(2)).await.unwrap();
        assert_eq!(again.origin, SourceOrigin::Cache);
    }

    #[tokio::test]
    async fn test_stale_store_row_is_refetched() {
        let store = MemoryStore::new();
        let old = stored(&addr(3), "Old", ChronoDuration::days(31));
        let created_at = old.created_at;
        store.insert_record(old);
        let h = harness(FakeApi::default().with(&addr(3), contract("New")), store);

        let result = h.resolver.resolve_full(&addr(3)).await.unwrap();
        assert_eq!(result.origin, SourceOrigin::Upstream);
        assert_eq!(result.source.contract_name, "New");
        assert_eq!(h.api.calls(), 1);

        let row = h.store.get(&addr(3)).await.unwrap().unwrap();
        assert_eq!(row.contract_name, "New");
        assert_eq!(row.created_at, created_at);
        assert!(row.updated_at > created_at);
    }

    #[tokio::test]
    async fn test_proxy_resolves_to_implementation() {
        let proxy = addr(4);
        let implementation = addr(5);
        let api = FakeApi::default()
            .with(&proxy, proxy_to(&implementation))
            .with(&implementation, contract("Logic"));
        let h = harness(api, MemoryStore::new());

        let result = h.resolver.resolve_full(&proxy).await.unwrap();
        assert_eq!(result.source.contract_name, "Logic");
        assert_eq!(result.resolved_address, implementation);

        // Both addresses now answer from the cache; only the implementation is stored
        assert_eq!(h.resolver.cache().get(&proxy).unwrap().contract_name, "Logic");
        assert_eq!(h.resolver.cache().get(&implementation).unwrap().contract_name, "Logic");
        assert!(h.store.get(&implementation).await.unwrap().is_some());
        assert!(h.store.get(&proxy).await.unwrap().is_none());

        let again = h.resolver.resolve_full(&proxy).await.unwrap();
        assert_eq!(again.origin, SourceOrigin::Cache);
        assert_eq!(h.api.calls(), 2);
    }

    #[tokio::test]
    async fn test_proxy_chain_depth_is_bounded() {
        // 10 -> 11 -> 12 -> 13 -> 14 -> 15, every hop a proxy
        let mut api = FakeApi::default();
        for n in 10..15u8 {
            api = api.with(&addr(n), proxy_to(&addr(n + 1)));
        }
        api = api.with(&addr(15), contract("TooDeep"));
        let h = harness(api, MemoryStore::new());

        match h.resolver.resolve(&addr(10)).await {
            Err(RetrieverError::ProxyDepthExceeded { max_depth, .. }) => {
                assert_eq!(max_depth, MAX_PROXY_DEPTH)
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(h.resolver.cache().is_empty());
    }

    #[tokio::test]
    async fn test_proxy_chain_within_depth() {
        let mut api = FakeApi::default();
        for n in 20..24u8 {
            api = api.with(&addr(n), proxy_to(&addr(n + 1)));
        }
        api = api.with(&addr(24), contract("Deep"));
        let h = harness(api, MemoryStore::new());

        let source = h.resolver.resolve(&addr(20)).await.unwrap();
        assert_eq!(source.contract_name, "Deep");
    }

    #[tokio::test]
    async fn test_upstream_error_is_not_cached() {
        let h = harness(FakeApi::default(), MemoryStore::new());

        let err = h.resolver.resolve(&addr(6)).await.unwrap_err();
        assert_eq!(err.to_string(), "Contract source code not verified");
        assert!(h.resolver.cache().is_empty());
        assert!(h.store.get(&addr(6)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_code_fails_before_caching() {
        let h = harness(FakeApi::default().with(&addr(0), contract("Ghost")), MemoryStore::new());

        assert!(matches!(
            h.resolver.resolve(&addr(0)).await,
            Err(RetrieverError::NotAContract(_))
        ));
        assert!(h.resolver.cache().get(&addr(0)).is_none());
        assert!(!h.resolver.is_contract(&addr(0)).await.unwrap());
    }
}
