//! Text chat endpoint.
//!
//! `POST /chat` is a stateless request/response against the Gemini
//! `generateContent` API: the caller carries its own history.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::core::text::messages::{Content, Part};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// One prior turn of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `user` or `model`
    pub role: String,
    pub content: String,
}

/// Request body for `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub system_instruction: Option<String>,
}

/// Response body for `POST /chat`.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The model's reply, verbatim
    pub reply: String,
    /// The model that produced it
    pub model: String,
}

/// Generate a reply for a chat message.
///
/// A malformed body is rejected by the `Json` extractor before this runs;
/// upstream failures surface as 502 via [`AppError`].
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    if request.message.trim().is_empty() {
        return Err(AppError::BadRequest("message must not be empty".to_string()));
    }

    let history: Vec<Content> = request
        .history
        .unwrap_or_default()
        .into_iter()
        .map(|turn| Content {
            role: Some(turn.role),
            parts: vec![Part::text(turn.content)],
        })
        .collect();

    let reply = state
        .text_client
        .generate(
            &request.message,
            history,
            request.system_instruction.as_deref(),
        )
        .await?;

    Ok(Json(ChatResponse {
        model: state.text_client.model().to_string(),
        reply,
    }))
}
