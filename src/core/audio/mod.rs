//! G.711 μ-law transcoding for the telephony leg.
//!
//! Twilio Media Streams carry 8 kHz G.711 μ-law; the Live API speaks linear
//! PCM. This module converts between the two, plus a fixed 3:1 decimator to
//! take the Live API's 24 kHz output down to the 8 kHz the phone network
//! expects. Frame boundaries carry no semantic meaning anywhere in the relay,
//! so every function is a pure per-sample transform.

/// Bias added before segment search (CCITT G.711).
const BIAS: i32 = 0x84;

/// Clip level for encoding.
const CLIP: i32 = 32635;

/// Encode one 16-bit linear sample as a μ-law byte.
pub fn linear_to_ulaw(pcm: i16) -> u8 {
    let mut sample = pcm as i32;
    let sign: u8 = if sample < 0 {
        sample = -sample;
        0x80
    } else {
        0x00
    };
    if sample > CLIP {
        sample = CLIP;
    }
    sample += BIAS;

    // Segment number: position of the highest set bit above bit 7
    let mut exponent: u32 = 7;
    let mut mask = 0x4000;
    while exponent > 0 && (sample & mask) == 0 {
        exponent -= 1;
        mask >>= 1;
    }

    let mantissa = ((sample >> (exponent + 3)) & 0x0F) as u8;
    !(sign | ((exponent as u8) << 4) | mantissa)
}

/// Decode one μ-law byte into a 16-bit linear sample.
pub fn ulaw_to_linear(ulaw: u8) -> i16 {
    let ulaw = !ulaw;
    let sign = ulaw & 0x80;
    let exponent = ((ulaw >> 4) & 0x07) as i32;
    let mantissa = (ulaw & 0x0F) as i32;

    let magnitude = (((mantissa << 3) + BIAS) << exponent) - BIAS;
    if sign != 0 {
        (-magnitude) as i16
    } else {
        magnitude as i16
    }
}

/// Decode a μ-law byte stream into little-endian 16-bit PCM bytes.
pub fn ulaw_to_pcm(ulaw: &[u8]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(ulaw.len() * 2);
    for &byte in ulaw {
        pcm.extend_from_slice(&ulaw_to_linear(byte).to_le_bytes());
    }
    pcm
}

/// Encode little-endian 16-bit PCM bytes as a μ-law byte stream.
///
/// A trailing odd byte (half a sample) is dropped.
pub fn pcm_to_ulaw(pcm: &[u8]) -> Vec<u8> {
    pcm.chunks_exact(2)
        .map(|pair| linear_to_ulaw(i16::from_le_bytes([pair[0], pair[1]])))
        .collect()
}

/// Decimate little-endian 16-bit PCM bytes 3:1 (24 kHz → 8 kHz).
///
/// Plain sample dropping, no anti-alias filter.
pub fn decimate_3to1(pcm: &[u8]) -> Vec<u8> {
    pcm.chunks_exact(2)
        .step_by(3)
        .flat_map(|pair| [pair[0], pair[1]])
        .collect()
}
