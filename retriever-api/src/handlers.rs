//! API route handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;

use retriever_core::error::RetrieverError;
use retriever_core::types::{validate_address, SourceCode};

use crate::dto::HealthResponse;
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// GET /code/:address
///
/// 400 if the address is malformed or holds no code, 500 if the node or
/// the source API fails.
pub async fn get_code(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<Arc<SourceCode>>> {
    let address = validate_address(&address)?;

    let is_contract = state.resolver.is_contract(address).await.map_err(|e| {
        ApiError::internal(format!("Failed to check if address is a contract: {e}"))
    })?;
    if !is_contract {
        return Err(RetrieverError::NotAContract(address.to_string()).into());
    }

    let source = state.resolver.resolve(address).await?;
    debug!(address, contract = %source.contract_name, "Served source");
    Ok(Json(source))
}

/// GET /code/ and GET /code
pub async fn missing_address() -> ApiError {
    ApiError::bad_request("Address is required")
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        cache: state.resolver.cache().stats().into(),
    })
}
