//! Request logging.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use tracing::info;

/// Logs client IP, method, path, status and latency of every request.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let ip = client_ip(&req);
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;

    info!(
        ip = %ip,
        %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "Request"
    );
    response
}

/// `X-Forwarded-For` if present, otherwise the peer address.
pub(crate) fn client_ip(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    {
        return forwarded.trim().to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".into())
}
