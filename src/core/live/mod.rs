//! Gemini Live API (BidiGenerateContent) client module.
//!
//! This module provides the WebSocket client used for bidirectional audio
//! streaming against the Gemini Live API: raw PCM goes up as base64 media
//! chunks, model audio comes back as base64 inline data.
//!
//! # Audio Format
//!
//! Input is PCM 16-bit signed little-endian, mono, at the configured sample
//! rate (16 kHz for browser clients, 8 kHz for telephony). Output is PCM
//! 16-bit mono at 24 kHz.
//!
//! # Session Lifetime
//!
//! A session lives exactly as long as its WebSocket. Any transport error and
//! any close, on either side, is terminal: there is no reconnection and no
//! retry. Callers observe the end of the session through the `on_closed`
//! callback and tear down their own side.
//!
//! # Example
//!
//! ```rust,ignore
//! use ai_calling_agent::core::live::{LiveClient, LiveConfig};
//! use std::sync::Arc;
//!
//! let mut client = LiveClient::new(LiveConfig {
//!     api_key: "...".to_string(),
//!     ..Default::default()
//! })?;
//!
//! client.on_audio(Arc::new(|pcm| Box::pin(async move {
//!     // forward pcm to the caller
//! })));
//!
//! client.connect().await?;
//! client.send_audio(audio_bytes).await?;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;

mod client;
mod config;
pub mod messages;

pub use client::LiveClient;
pub use config::{
    LIVE_INPUT_SAMPLE_RATE, LIVE_OUTPUT_SAMPLE_RATE, LiveConfig, Modality, SETUP_TIMEOUT,
};

/// Errors that can occur during Live sessions.
#[derive(Debug, Error)]
pub enum LiveError {
    /// Connection to the Live API failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Missing or rejected API key
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// WebSocket transport error
    #[error("websocket error: {0}")]
    WebSocketError(String),

    /// Message (de)serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// The setup handshake did not complete in time
    #[error("setup timed out after {0:?}")]
    SetupTimeout(std::time::Duration),

    /// Not connected
    #[error("not connected")]
    NotConnected,
}

/// Result type for Live operations.
pub type LiveResult<T> = Result<T, LiveError>;

/// Callback for model audio output (raw PCM, 24 kHz, 16-bit, mono).
pub type AudioCallback =
    Arc<dyn Fn(Bytes) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback fired when the server reports the model was interrupted.
pub type InterruptedCallback =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback for terminal session errors.
pub type ErrorCallback =
    Arc<dyn Fn(LiveError) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback fired exactly once when the upstream session ends, for any reason.
pub type ClosedCallback = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;
