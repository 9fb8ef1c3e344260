use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, chat};
use crate::state::AppState;
use std::sync::Arc;

/// Create the HTTP API router.
///
/// # Endpoints
///
/// - `GET /` - index payload naming the available endpoints
/// - `GET /health` - fixed status payload
/// - `POST /chat` - text generation against the Gemini REST API
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::index))
        .route("/health", get(api::health_check))
        .route("/chat", post(chat::chat_handler))
        .layer(TraceLayer::new_for_http())
}
