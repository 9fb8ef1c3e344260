//! Connection limits for WebSocket sessions.
//!
//! Applied in front of the WebSocket routes. A slot is acquired here before
//! the upgrade proceeds; the handler releases it on teardown using the
//! [`ClientIp`] extension injected into the request. Non-upgrade requests
//! pass through untouched.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::state::{AppState, ConnectionLimitError};

/// The client IP whose connection slot the handler must release.
#[derive(Clone, Copy, Debug)]
pub struct ClientIp(pub IpAddr);

/// Enforce the global and per-IP WebSocket session caps.
///
/// - 503 when the global cap is reached
/// - 429 when the per-IP cap is reached
pub async fn connection_limit_middleware(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let is_ws_upgrade = request
        .headers()
        .get(http::header::UPGRADE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("websocket"));

    if !is_ws_upgrade {
        return next.run(request).await;
    }

    let ip = addr.ip();
    match state.try_acquire_connection(ip) {
        Ok(()) => {
            request.extensions_mut().insert(ClientIp(ip));
            next.run(request).await
        }
        Err(ConnectionLimitError::GlobalLimitReached) => {
            tracing::warn!(%ip, "rejecting session: server at capacity");
            (StatusCode::SERVICE_UNAVAILABLE, "server at capacity").into_response()
        }
        Err(ConnectionLimitError::PerIpLimitReached) => {
            tracing::warn!(%ip, "rejecting session: too many connections from this address");
            (
                StatusCode::TOO_MANY_REQUESTS,
                "too many connections from this address",
            )
                .into_response()
        }
    }
}
