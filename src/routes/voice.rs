//! Voice WebSocket route configuration.

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::voice::voice_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the voice WebSocket router.
///
/// # Endpoint
///
/// `GET /ws/voice` - WebSocket upgrade for the duplex audio relay
///
/// # Protocol
///
/// After the upgrade:
/// - client sends binary frames of raw PCM (16 kHz, 16-bit, mono)
/// - server sends binary frames of raw PCM (24 kHz, 16-bit, mono)
/// - text frames from the client are forwarded as complete user turns
///
/// Closing either side of the relay closes the other.
pub fn create_voice_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws/voice", get(voice_handler))
        .layer(TraceLayer::new_for_http())
}
