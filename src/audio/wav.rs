//! WAV file reading/writing for the offline processing mode.

use crate::error::{HushmicError, Result};
use std::io::{Read, Seek, Write};

/// Read a WAV file into mono i16 samples at the requested rate.
///
/// Accepts arbitrary source rates and channel counts: stereo is averaged
/// down to mono and the result is linearly resampled when rates differ.
pub fn read_samples(reader: impl Read, target_rate: u32) -> Result<Vec<i16>> {
    let mut wav_reader = hound::WavReader::new(reader).map_err(|e| HushmicError::AudioStream {
        message: format!("Failed to parse WAV file: {}", e),
    })?;

    let spec = wav_reader.spec();
    let source_rate = spec.sample_rate;
    let source_channels = spec.channels as usize;

    let raw_samples: Vec<i16> = wav_reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| HushmicError::AudioStream {
            message: format!("Failed to read WAV samples: {}", e),
        })?;

    let mono_samples = if source_channels > 1 {
        raw_samples
            .chunks_exact(source_channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / source_channels as i32) as i16
            })
            .collect()
    } else {
        raw_samples
    };

    if source_rate != target_rate {
        Ok(resample(&mono_samples, source_rate, target_rate))
    } else {
        Ok(mono_samples)
    }
}

/// Write mono i16 samples as a 16-bit PCM WAV file.
pub fn write_samples(
    writer: impl Write + Seek,
    samples: &[i16],
    sample_rate: u32,
) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut wav_writer =
        hound::WavWriter::new(writer, spec).map_err(|e| HushmicError::AudioStream {
            message: format!("Failed to create WAV writer: {}", e),
        })?;
    for &sample in samples {
        wav_writer
            .write_sample(sample)
            .map_err(|e| HushmicError::AudioStream {
                message: format!("Failed to write WAV sample: {}", e),
            })?;
    }
    wav_writer.finalize().map_err(|e| HushmicError::AudioStream {
        message: format!("Failed to finalize WAV file: {}", e),
    })?;
    Ok(())
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[samples.len() - 1]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}
