//! Gemini Live API configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_LIVE_ENDPOINT, DEFAULT_MODEL};

/// Sample rate of audio sent by browser clients (Hz).
pub const LIVE_INPUT_SAMPLE_RATE: u32 = 16000;

/// Sample rate of audio returned by the Live API (Hz).
pub const LIVE_OUTPUT_SAMPLE_RATE: u32 = 24000;

/// How long to wait for the server's `setupComplete` after connecting.
pub const SETUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Response modalities for a Live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    /// Spoken audio output
    Audio,
    /// Text output
    Text,
}

/// Configuration for one Live session.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// Gemini API key
    pub api_key: String,

    /// Model name, with or without the `models/` prefix
    pub model: String,

    /// System instruction applied to the session
    pub system_instruction: Option<String>,

    /// Prebuilt voice name for audio output (server default when `None`)
    pub voice: Option<String>,

    /// Requested response modalities
    pub response_modalities: Vec<Modality>,

    /// Sample rate of the audio this session sends upstream (Hz)
    pub input_sample_rate: u32,

    /// WebSocket endpoint; override for tests and proxies
    pub endpoint: String,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            system_instruction: None,
            voice: None,
            response_modalities: vec![Modality::Audio],
            input_sample_rate: LIVE_INPUT_SAMPLE_RATE,
            endpoint: DEFAULT_LIVE_ENDPOINT.to_string(),
        }
    }
}

impl LiveConfig {
    /// Model name qualified with the `models/` prefix the API expects.
    pub fn qualified_model(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    /// Mime type for media chunks sent upstream.
    pub fn input_mime_type(&self) -> String {
        format!("audio/pcm;rate={}", self.input_sample_rate)
    }
}
