//! API route configuration.

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))

        // Source lookup
        .route("/code", get(handlers::missing_address))
        .route("/code/", get(handlers::missing_address))
        .route("/code/:address", get(handlers::get_code))

        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use retriever_cache::TtlCache;
    use retriever_core::constants::CACHE_SWEEP_INTERVAL;
    use retriever_core::error::{Result, RetrieverError};
    use retriever_core::traits::{ContractInspector, SourceCodeApi};
    use retriever_core::types::SourceCode;
    use retriever_resolver::{ResolverConfig, SourceResolver};
    use retriever_store::MemoryStore;

    const TOKEN: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";
    const WALLET: &str = "0x0000000000000000000000000000000000000001";
    const UNVERIFIED: &str = "0x0000000000000000000000000000000000000002";
    const FLAKY: &str = "0x0000000000000000000000000000000000000003";

    #[derive(Default)]
    struct FakeApi {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SourceCodeApi for FakeApi {
        async fn fetch_source(&self, address: &str) -> Result<SourceCode> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if address == TOKEN {
                Ok(SourceCode {
                    contract_name: "TetherToken".into(),
                    proxy: "0".into(),
                    ..Default::default()
                })
            } else {
                Err(RetrieverError::Upstream("Contract source code not verified".into()))
            }
        }
    }

    struct FakeInspector;

    #[async_trait]
    impl ContractInspector for FakeInspector {
        async fn is_contract(&self, address: &str) -> Result<bool> {
            match address {
                FLAKY => Err(RetrieverError::RpcError("connection reset".into())),
                WALLET => Ok(false),
                _ => Ok(true),
            }
        }

        async fn code_hash(&self, _address: &str) -> Result<String> {
            Ok(format!("0x{}", "ab".repeat(32)))
        }
    }

    fn test_app() -> (Router, Arc<FakeApi>) {
        let api = Arc::new(FakeApi::default());
        let resolver = SourceResolver::new(
            api.clone(),
            Arc::new(FakeInspector),
            Arc::new(MemoryStore::new()),
            Arc::new(TtlCache::new(CACHE_SWEEP_INTERVAL)),
            ResolverConfig::default(),
        );
        (create_router(Arc::new(AppState::new(resolver))), api)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _) = test_app();
        let (status, body) = get_json(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cache"]["total_entries"], 0);
    }

    #[tokio::test]
    async fn test_get_code() {
        let (app, api) = test_app();

        let (status, body) = get_json(app.clone(), &format!("/code/{TOKEN}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["contractName"], "TetherToken");

        // Second request is answered by the cache
        let (status, _) = get_json(app.clone(), &format!("/code/{TOKEN}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);

        let (_, health) = get_json(app, "/health").await;
        assert_eq!(health["cache"]["valid_entries"], 1);
    }

    #[tokio::test]
    async fn test_missing_address() {
        for uri in ["/code", "/code/"] {
            let (app, _) = test_app();
            let (status, body) = get_json(app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["message"], "Address is required");
        }
    }

    #[tokio::test]
    async fn test_malformed_address() {
        let (app, api) = test_app();
        let (status, body) = get_json(app, "/code/0x123").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_not_a_contract() {
        let (app, api) = test_app();
        let (status, body) = get_json(app, &format!("/code/{WALLET}")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "NOT_A_CONTRACT");
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_contract_check_failure() {
        let (app, _) = test_app();
        let (status, body) = get_json(app, &format!("/code/{FLAKY}")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.starts_with("Failed to check if address is a contract"));
    }

    #[tokio::test]
    async fn test_upstream_failure() {
        let (app, _) = test_app();
        let (status, body) = get_json(app, &format!("/code/{UNVERIFIED}")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "Contract source code not verified");
    }
}
