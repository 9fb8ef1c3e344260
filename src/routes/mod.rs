//! Route configuration.
//!
//! Each surface gets its own router; [`build_app`] assembles them with the
//! middleware that belongs to the routes themselves (connection limits on the
//! WebSocket upgrades). Process-wide layers (CORS, rate limiting, security
//! headers) are applied in `main`, where the configuration lives.

use std::sync::Arc;

use axum::{Router, middleware};

use crate::middleware::connection_limit_middleware;
use crate::state::AppState;

pub mod api;
pub mod twilio;
pub mod voice;

/// Assemble the full application router.
pub fn build_app(state: Arc<AppState>) -> Router {
    let ws_routes = voice::create_voice_router()
        .merge(twilio::create_media_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            connection_limit_middleware,
        ));

    api::create_api_router()
        .merge(twilio::create_webhook_router())
        .merge(ws_routes)
        .with_state(state)
}
