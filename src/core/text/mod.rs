//! Gemini text generation (`generateContent`) client module.
//!
//! A thin REST client used by `POST /chat`. One request, one response; the
//! reply is the first candidate's concatenated text parts.

use thiserror::Error;

mod client;
pub mod messages;

pub use client::TextClient;

/// Errors from the text generation client.
#[derive(Debug, Error)]
pub enum TextError {
    /// No API key configured in the server environment
    #[error("GEMINI_API_KEY is not configured in the server environment")]
    MissingApiKey,

    /// Transport-level failure talking to the API
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("generateContent returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The API answered 2xx but with no usable candidate text
    #[error("generateContent returned no candidate text")]
    EmptyResponse,
}

/// Result type for text generation.
pub type TextResult<T> = Result<T, TextError>;
