//! # Retriever API Server
//!
//! Read-through HTTP front end for verified contract source code.
//!
//! ## Endpoints
//!
//! - `GET /code/:address` - Verified source record for a contract
//! - `GET /health` - Liveness and cache occupancy
//!
//! ## Example
//!
//! ```rust,ignore
//! use retriever_api::{ApiConfig, ApiServer, AppState};
//!
//! let config = ApiConfig::new(api_key, rpc_url);
//! let state = Arc::new(AppState::from_config(&config).await?);
//! ApiServer::new(state).run(([0, 0, 0, 0], 8080), shutdown_signal()).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dto;
mod error;
mod handlers;
mod middleware;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{ApiConfig, AppState};

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// API server for the retriever.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a server over the given state.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Creates the router with all routes and layers configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        create_router(self.state.clone())
            .layer(axum::middleware::from_fn(middleware::log_requests))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Serves on `addr` until `shutdown` resolves.
    pub async fn run<F>(self, addr: impl Into<SocketAddr>, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("Retriever API server listening on {}", addr);

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutting down");
}
