//! Twilio Media Streams WebSocket message types.
//!
//! Twilio sends JSON text frames tagged by an `event` field; audio payloads
//! are base64-encoded G.711 μ-law at 8 kHz. Outbound frames use the same
//! envelope. Only the events this gateway reacts to are modeled; everything
//! else lands in `Other` and is ignored.

use base64::prelude::*;
use serde::{Deserialize, Serialize};

// =============================================================================
// Inbound (Twilio -> gateway)
// =============================================================================

/// Events received from Twilio on the media stream.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum MediaStreamInbound {
    /// First frame after the WebSocket opens
    Connected {},

    /// Stream metadata; carries the `streamSid` used in outbound frames
    Start {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        start: StartMeta,
    },

    /// One chunk of caller audio
    Media { media: MediaPayload },

    /// The stream is over
    Stop {},

    /// Any event this gateway does not react to (`mark`, `dtmf`, ...)
    #[serde(other)]
    Other,
}

/// Metadata from the `start` event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartMeta {
    pub account_sid: Option<String>,
    pub call_sid: Option<String>,
    pub media_format: Option<MediaFormat>,
}

/// Declared format of the inbound audio.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaFormat {
    pub encoding: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
}

/// Audio payload of a `media` event.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaPayload {
    /// Base64-encoded μ-law audio
    pub payload: String,
}

impl MediaPayload {
    /// Decode the payload into raw μ-law bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64_STANDARD.decode(&self.payload)
    }
}

// =============================================================================
// Outbound (gateway -> Twilio)
// =============================================================================

/// Events sent back to Twilio.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum MediaStreamOutbound {
    /// One chunk of agent audio
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutboundMedia,
    },

    /// Drop any audio Twilio has buffered but not yet played
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

/// Outbound audio payload.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMedia {
    /// Base64-encoded μ-law audio
    pub payload: String,
}

impl MediaStreamOutbound {
    /// Build a `media` event from raw μ-law bytes.
    pub fn media(stream_sid: impl Into<String>, ulaw: &[u8]) -> Self {
        MediaStreamOutbound::Media {
            stream_sid: stream_sid.into(),
            media: OutboundMedia {
                payload: BASE64_STANDARD.encode(ulaw),
            },
        }
    }

    /// Build a `clear` event.
    pub fn clear(stream_sid: impl Into<String>) -> Self {
        MediaStreamOutbound::Clear {
            stream_sid: stream_sid.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_event_deserialization() {
        let json = r#"{
            "event": "start",
            "sequenceNumber": "1",
            "streamSid": "MZ0123",
            "start": {
                "accountSid": "AC999",
                "callSid": "CA111",
                "mediaFormat": {"encoding": "audio/x-mulaw", "sampleRate": 8000, "channels": 1}
            }
        }"#;

        match serde_json::from_str::<MediaStreamInbound>(json).unwrap() {
            MediaStreamInbound::Start { stream_sid, start } => {
                assert_eq!(stream_sid, "MZ0123");
                assert_eq!(start.call_sid.as_deref(), Some("CA111"));
                assert_eq!(start.media_format.unwrap().sample_rate, Some(8000));
            }
            other => panic!("expected Start, got {other:?}"),
        }
    }

    #[test]
    fn test_media_event_payload_decodes() {
        let json = r#"{
            "event": "media",
            "media": {"track": "inbound", "chunk": "2", "timestamp": "20", "payload": "//8A"}
        }"#;

        match serde_json::from_str::<MediaStreamInbound>(json).unwrap() {
            MediaStreamInbound::Media { media } => {
                assert_eq!(media.decode().unwrap(), vec![0xFF, 0xFF, 0x00]);
            }
            other => panic!("expected Media, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_event_is_other() {
        let json = r#"{"event": "mark", "mark": {"name": "greeting"}}"#;
        match serde_json::from_str::<MediaStreamInbound>(json).unwrap() {
            MediaStreamInbound::Other => {}
            other => panic!("expected Other, got {other:?}"),
        }
    }

    #[test]
    fn test_outbound_media_serialization() {
        let event = MediaStreamOutbound::media("MZ0123", &[0xFF, 0x7F]);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "media");
        assert_eq!(json["streamSid"], "MZ0123");
        assert_eq!(json["media"]["payload"], BASE64_STANDARD.encode([0xFF, 0x7F]));
    }

    #[test]
    fn test_outbound_clear_serialization() {
        let json = serde_json::to_value(MediaStreamOutbound::clear("MZ9")).unwrap();
        assert_eq!(json["event"], "clear");
        assert_eq!(json["streamSid"], "MZ9");
    }
}
