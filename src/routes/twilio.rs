//! Twilio telephony route configuration.
//!
//! The webhook and the media stream are separate routers because only the
//! media stream is a WebSocket and takes the connection-limit middleware.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::twilio::{incoming_call_handler, media_stream_handler};
use crate::state::AppState;
use std::sync::Arc;

/// Create the Twilio webhook router.
///
/// `POST /twilio/incoming` - voice webhook returning TwiML
pub fn create_webhook_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/twilio/incoming", post(incoming_call_handler))
        .layer(TraceLayer::new_for_http())
}

/// Create the Twilio media-stream router.
///
/// `GET /twilio/media` - WebSocket upgrade for Twilio Media Streams
pub fn create_media_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/twilio/media", get(media_stream_handler))
        .layer(TraceLayer::new_for_http())
}
