//! Gemini Live API (BidiGenerateContent) WebSocket message types.
//!
//! All messages are JSON text frames. A client message is an object with
//! exactly one of the keys `setup`, `realtimeInput`, or `clientContent`
//! (externally tagged). A server message may combine several fields in one
//! frame (for example `serverContent` alongside `usageMetadata`), so it is
//! modeled as a struct of options rather than an enum.
//!
//! # Protocol Overview
//!
//! Client messages:
//! - `setup` - opens the session: model, generation config, system instruction
//! - `realtimeInput` - streamed media chunks (base64 PCM)
//! - `clientContent` - explicit text turns
//!
//! Server messages:
//! - `setupComplete` - session is ready for input
//! - `serverContent` - model turn parts (inline audio and/or text),
//!   turn-complete and interruption flags
//! - `goAway` - server is about to drop the connection
//! - `usageMetadata` - token accounting

use base64::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::Modality;

// =============================================================================
// Shared Content Types
// =============================================================================

/// A typed blob of base64-encoded media.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// Mime type, e.g. `audio/pcm;rate=16000`
    pub mime_type: String,
    /// Base64-encoded payload
    pub data: String,
}

impl Blob {
    /// Encode raw bytes into a blob with the given mime type.
    pub fn encode(mime_type: impl Into<String>, data: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: BASE64_STANDARD.encode(data),
        }
    }

    /// Decode the base64 payload back into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64_STANDARD.decode(&self.data)
    }
}

/// One part of a content turn: text or inline media.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

impl Part {
    /// A plain text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// A content turn: an optional role plus its parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A user turn with a single text part.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part::text(text)],
        }
    }

    /// A role-less turn with a single text part (used for system instructions).
    pub fn system_text(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }
}

// =============================================================================
// Client Messages
// =============================================================================

/// Messages sent to the Live API. Serializes externally tagged, which is
/// exactly the wire shape: `{"setup": {...}}`, `{"realtimeInput": {...}}`.
#[derive(Debug, Clone, Serialize)]
pub enum ClientMessage {
    #[serde(rename = "setup")]
    Setup(Setup),
    #[serde(rename = "realtimeInput")]
    RealtimeInput(RealtimeInput),
    #[serde(rename = "clientContent")]
    ClientContent(ClientContent),
}

impl ClientMessage {
    /// An audio media chunk message.
    pub fn audio_chunk(mime_type: impl Into<String>, pcm: &[u8]) -> Self {
        ClientMessage::RealtimeInput(RealtimeInput {
            media_chunks: vec![Blob::encode(mime_type, pcm)],
        })
    }

    /// A complete user text turn.
    pub fn user_text(text: impl Into<String>) -> Self {
        ClientMessage::ClientContent(ClientContent {
            turns: vec![Content::user_text(text)],
            turn_complete: true,
        })
    }
}

/// Session setup, sent once as the first message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    /// Qualified model name (`models/...`)
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

/// Generation configuration for the session.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub response_modalities: Vec<Modality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

/// Speech output configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

/// Voice selection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

/// Prebuilt voice by name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

impl SpeechConfig {
    /// Speech config selecting a prebuilt voice by name.
    pub fn prebuilt(voice_name: impl Into<String>) -> Self {
        Self {
            voice_config: VoiceConfig {
                prebuilt_voice_config: PrebuiltVoiceConfig {
                    voice_name: voice_name.into(),
                },
            },
        }
    }
}

/// Streamed realtime media input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    pub media_chunks: Vec<Blob>,
}

/// Explicit (non-realtime) content turns.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContent {
    pub turns: Vec<Content>,
    pub turn_complete: bool,
}

// =============================================================================
// Server Messages
// =============================================================================

/// One frame received from the Live API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerMessage {
    pub setup_complete: Option<SetupComplete>,
    pub server_content: Option<ServerContent>,
    pub go_away: Option<GoAway>,
    pub usage_metadata: Option<UsageMetadata>,
}

/// Acknowledgement that the session setup was accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetupComplete {}

/// Incremental model output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerContent {
    /// Parts generated so far in the current model turn
    pub model_turn: Option<Content>,
    /// The model finished its turn
    pub turn_complete: bool,
    /// The model was interrupted by new user input
    pub interrupted: bool,
}

/// Advance warning that the server will drop the connection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoAway {
    /// Remaining time as an RFC 3339 duration string, e.g. "9.5s"
    pub time_left: Option<String>,
}

/// Token accounting for the session so far.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u64>,
    pub response_token_count: Option<u64>,
    pub total_token_count: Option<u64>,
}
