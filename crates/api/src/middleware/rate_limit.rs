//! Axum middleware in front of the [`RateLimiter`](crate::limiter::RateLimiter).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use episodic_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let config = state.limiter.config();
    if !config.enabled {
        return next.run(req).await;
    }

    let addr = client_addr(&req, config.trust_proxy_headers);
    if !state.limiter.allow(addr) {
        tracing::warn!(%addr, "Rate limit exceeded");
        return AppError::Core(CoreError::RateLimited).into_response();
    }

    next.run(req).await
}

/// The address a request is accounted against.
///
/// Proxy headers are only consulted when the deployment says they can be
/// trusted; otherwise the socket peer is used. Requests with neither fall
/// into one shared `0.0.0.0` bucket.
pub fn client_addr(req: &Request, trust_proxy_headers: bool) -> IpAddr {
    if trust_proxy_headers {
        if let Some(addr) = forwarded_addr(req.headers()) {
            return addr;
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn forwarded_addr(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse().ok())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse().ok())
        })
}
