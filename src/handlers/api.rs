//! Service status and index endpoints.

use axum::Json;
use serde_json::{Value, json};

/// Health check endpoint.
///
/// Returns a fixed payload, independent of any remote-service state, so load
/// balancers and orchestrators can probe the gateway itself.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "ai-calling-agent",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Root endpoint listing the available surfaces.
pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "AI Calling Agent API",
        "endpoints": {
            "health": "/health",
            "chat": "/chat",
            "voice": "/ws/voice",
            "twilio_incoming": "/twilio/incoming",
            "twilio_media": "/twilio/media",
        },
    }))
}
