//! PCM codec
//!
//! Pure conversions between raw little-endian PCM16 byte buffers,
//! normalized f32 samples, the base64 transport encoding, and WAV
//! containers. No I/O, no shared state.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::{Error, Result};

/// Encode bytes as base64 for transport
#[must_use]
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a base64 transport payload back to bytes
///
/// # Errors
///
/// Returns `Error::MalformedAudio` if the input is not valid base64
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(data)
        .map_err(|e| Error::MalformedAudio(format!("invalid base64 payload: {e}")))
}

/// Reinterpret a PCM16 byte buffer as normalized f32 samples, de-interleaved
/// by channel
///
/// Each signed little-endian 16-bit sample is divided by 32768, mapping the
/// full int16 range onto approximately [-1, 1).
///
/// # Errors
///
/// Returns `Error::MalformedAudio` if `channels` is zero or the byte length
/// is not a multiple of `2 * channels`
pub fn pcm16_to_f32(bytes: &[u8], channels: usize) -> Result<Vec<Vec<f32>>> {
    if channels == 0 {
        return Err(Error::MalformedAudio("zero channel count".to_string()));
    }
    if bytes.len() % (2 * channels) != 0 {
        return Err(Error::MalformedAudio(format!(
            "{} bytes is not a whole number of {channels}-channel PCM16 frames",
            bytes.len()
        )));
    }

    let frames = bytes.len() / (2 * channels);
    let mut out = vec![Vec::with_capacity(frames); channels];

    for (i, pair) in bytes.chunks_exact(2).enumerate() {
        let sample = i16::from_le_bytes([pair[0], pair[1]]);
        out[i % channels].push(f32::from(sample) / 32768.0);
    }

    Ok(out)
}

/// Decode a mono PCM16 byte buffer to normalized f32 samples
///
/// # Errors
///
/// Returns `Error::MalformedAudio` if the byte length is odd
pub fn pcm16_to_mono_f32(bytes: &[u8]) -> Result<Vec<f32>> {
    let mut channels = pcm16_to_f32(bytes, 1)?;
    Ok(channels.swap_remove(0))
}

/// Pack normalized f32 samples as little-endian PCM16 bytes
///
/// Out-of-range inputs clamp to the int16 range rather than wrapping.
#[must_use]
pub fn f32_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        #[allow(clippy::cast_possible_truncation)]
        let value = (sample * 32768.0).clamp(-32768.0, 32767.0) as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Wrap raw PCM bytes in a standard 44-byte RIFF/WAVE container
///
/// The PCM payload is carried verbatim after the header.
///
/// # Errors
///
/// Returns `Error::MalformedAudio` if `bits_per_sample` is not 16 (the only
/// depth this system produces) or the payload length does not divide into
/// whole frames
pub fn wrap_wav(
    pcm: &[u8],
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
) -> Result<Vec<u8>> {
    if bits_per_sample != 16 {
        return Err(Error::MalformedAudio(format!(
            "unsupported bit depth: {bits_per_sample}"
        )));
    }
    if channels == 0 || pcm.len() % (2 * channels as usize) != 0 {
        return Err(Error::MalformedAudio(format!(
            "{} bytes is not a whole number of {channels}-channel PCM16 frames",
            pcm.len()
        )));
    }

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| Error::MalformedAudio(e.to_string()))?;

        for pair in pcm.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
                .map_err(|e| Error::MalformedAudio(e.to_string()))?;
        }

        writer
            .finalize()
            .map_err(|e| Error::MalformedAudio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_round_trip() {
        let bytes: Vec<u8> = (0..=255).collect();
        assert_eq!(decode_base64(&encode_base64(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn stereo_deinterleave() {
        // Two frames of L/R pairs: [1, 2], [3, 4]
        let mut bytes = Vec::new();
        for v in [1i16, 2, 3, 4] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }

        let channels = pcm16_to_f32(&bytes, 2).unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0], vec![1.0 / 32768.0, 3.0 / 32768.0]);
        assert_eq!(channels[1], vec![2.0 / 32768.0, 4.0 / 32768.0]);
    }

    #[test]
    fn out_of_range_samples_clamp() {
        let bytes = f32_to_pcm16(&[2.0, -2.0]);
        assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), i16::MAX);
        assert_eq!(i16::from_le_bytes([bytes[2], bytes[3]]), i16::MIN);
    }
}
