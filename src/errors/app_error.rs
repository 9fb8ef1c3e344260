//! Application-level error type with HTTP response mapping.
//!
//! Handlers return [`AppResult`]; the [`IntoResponse`] impl turns each variant
//! into a status code plus a JSON body of the form `{"error": "..."}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;
use crate::core::live::LiveError;
use crate::core::text::TextError;

/// Result type for HTTP handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum AppError {
    /// The request was malformed or failed validation
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The gateway is missing configuration required for this request
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Text generation against the remote API failed
    #[error(transparent)]
    Text(#[from] TextError),

    /// A Live session failed
    #[error(transparent)]
    Live(#[from] LiveError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            // Missing API key and friends are the operator's problem, not the
            // caller's, but must not leak configuration details upward.
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Text(TextError::MissingApiKey) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Text(_) | AppError::Live(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
