//! Offline WAV processing through the real frame loop.

use hushmic::audio::{pcm, wav};
use hushmic::denoise::ReceptiveField;
use hushmic::pipeline::{process_offline, FrameProcessor, PipelineConfig};
use hushmic::Denoiser;
use std::io::Cursor;
use std::sync::Arc;

/// Halves every sample so processed output is recognizable.
struct HalvingDenoiser;

impl Denoiser for HalvingDenoiser {
    fn receptive_field(&self) -> ReceptiveField {
        ReceptiveField::new(10, 5)
    }

    fn process(&self, frame: &[f32]) -> hushmic::Result<Vec<f32>> {
        Ok(frame.iter().map(|&s| s / 2.0).collect())
    }
}

fn make_wav(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    wav::write_samples(&mut cursor, samples, sample_rate).unwrap();
    cursor.into_inner()
}

#[test]
fn wav_round_trip_preserves_length_and_applies_model() {
    // 2.5 frames at 320 samples: forces a trailing partial frame.
    let samples = vec![10000i16; 800];
    let data = make_wav(16000, &samples);

    let read = wav::read_samples(Cursor::new(data), 16000).unwrap();
    assert_eq!(read, samples);

    let processor = FrameProcessor::new(
        Arc::new(HalvingDenoiser) as Arc<dyn Denoiser>,
        PipelineConfig::default(),
        Vec::new(),
    );
    let denoised = process_offline(&processor, &read, 320);

    assert_eq!(denoised.len(), samples.len());
    assert!(denoised.iter().all(|&s| s == 5000));

    // Written output reads back identically.
    let out = make_wav(16000, &denoised);
    let reread = wav::read_samples(Cursor::new(out), 16000).unwrap();
    assert_eq!(reread, denoised);
}

#[test]
fn short_wav_below_frame_size_still_processes() {
    // 7 samples: below pad_sum 10, so the preparer pads before inference
    // and the output is trimmed back to the captured length.
    let samples = vec![8000i16, -8000, 8000, -8000, 8000, -8000, 8000];
    let processor = FrameProcessor::new(
        Arc::new(HalvingDenoiser) as Arc<dyn Denoiser>,
        PipelineConfig::default(),
        Vec::new(),
    );
    let denoised = process_offline(&processor, &samples, 320);

    assert_eq!(denoised.len(), samples.len());
    assert_eq!(denoised[0], 4000);
    assert_eq!(denoised[1], -4000);
    assert_eq!(processor.stats().padded, 1);
}

#[test]
fn resampled_input_keeps_duration() {
    // Half a second at 48kHz collapses to half a second at 16kHz.
    let samples = vec![100i16; 24000];
    let data = make_wav(48000, &samples);
    let read = wav::read_samples(Cursor::new(data), 16000).unwrap();
    assert!((read.len() as i64 - 8000).abs() <= 1);
}

#[test]
fn pcm_and_wav_agree_on_sample_values() {
    let samples = vec![0i16, 1, -1, i16::MAX, i16::MIN];
    let bytes = pcm::i16_to_bytes(&samples);
    let decoded = pcm::decode_frame(&bytes);
    let encoded = pcm::encode_frame(&decoded);
    assert_eq!(pcm::bytes_to_i16(&encoded), samples);
}
