//! PCM sample codec for the audio boundary.
//!
//! The platform side of the callback speaks interleaved 16-bit signed
//! little-endian PCM; the pipeline works on normalized f32. Normalization
//! divides by 32768; encoding multiplies back and clips to the valid
//! integer range.

/// Decode little-endian i16 frame bytes to normalized f32 samples.
///
/// A trailing odd byte (which a conforming platform never produces) is
/// ignored rather than rejected, keeping the callback total.
pub fn decode_frame(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

/// Encode normalized f32 samples to little-endian i16 frame bytes,
/// clipping to [-32768, 32767].
pub fn encode_frame(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        bytes.extend_from_slice(&sample_to_i16(sample).to_le_bytes());
    }
    bytes
}

/// Convert one normalized sample to a clipped i16.
pub fn sample_to_i16(sample: f32) -> i16 {
    (sample * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Reinterpret an i16 slice as frame bytes.
pub fn i16_to_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// Parse frame bytes back into i16 samples.
pub fn bytes_to_i16(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
