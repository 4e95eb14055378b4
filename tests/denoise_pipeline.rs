//! End-to-end pipeline scenarios driven through the public API with a mock
//! model and a mock duplex backend; no audio hardware or model files.

use hushmic::audio::pcm;
use hushmic::audio::stream::MockDuplex;
use hushmic::denoise::{self, PadMode, ReceptiveField};
use hushmic::pipeline::{AudioPipeline, FrameProcessor, PipelineConfig};
use hushmic::{Denoiser, HushmicError, StreamParams};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Identity model that records every input length it sees and can be
/// switched into a failure mode.
struct ProbeDenoiser {
    receptive: ReceptiveField,
    seen_lengths: Mutex<Vec<usize>>,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl ProbeDenoiser {
    fn new(receptive: ReceptiveField) -> Self {
        Self {
            receptive,
            seen_lengths: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }
}

impl Denoiser for ProbeDenoiser {
    fn receptive_field(&self) -> ReceptiveField {
        self.receptive
    }

    fn process(&self, frame: &[f32]) -> hushmic::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(HushmicError::InferenceFailure {
                message: "probe failure".to_string(),
            });
        }
        // A model with a one-sided pad of N breaks below N+1 input samples;
        // assert the preparer never lets such a frame through.
        assert!(
            frame.len() > self.receptive.max_single_pad,
            "inference saw a frame of {} samples with max_single_pad {}",
            frame.len(),
            self.receptive.max_single_pad
        );
        self.seen_lengths.lock().unwrap().push(frame.len());
        Ok(frame.to_vec())
    }
}

fn build_pipeline(
    receptive: ReceptiveField,
    config: PipelineConfig,
) -> (
    AudioPipeline,
    Arc<ProbeDenoiser>,
    hushmic::audio::stream::MockDuplexHandle,
) {
    let engine = Arc::new(ProbeDenoiser::new(receptive));
    let processor = Arc::new(FrameProcessor::new(
        Arc::clone(&engine) as Arc<dyn Denoiser>,
        config,
        Vec::new(),
    ));
    let duplex = MockDuplex::new();
    let handle = duplex.handle();
    let pipeline = AudioPipeline::new(processor, Box::new(duplex), StreamParams::default());
    (pipeline, engine, handle)
}

#[test]
fn silence_in_silence_out_at_nominal_frame_size() {
    // 16kHz / 20ms → 320-sample frames; unconstrained model.
    let params = StreamParams::default();
    assert_eq!(params.frame_len(), 320);

    let (pipeline, engine, handle) =
        build_pipeline(ReceptiveField::default(), PipelineConfig::default());
    pipeline.start_stream().unwrap();

    let input = pcm::i16_to_bytes(&vec![0i16; 320]);
    let output = handle.push_frame(&input).expect("stream should be open");

    assert_eq!(output.len(), input.len());
    assert!(pcm::bytes_to_i16(&output).iter().all(|&s| s == 0));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);

    pipeline.stop_stream().unwrap();
}

#[test]
fn five_samples_against_pad_sum_ten_prepares_eleven() {
    // min_input_length below the pad floor so pad_sum + 1 dominates.
    let decision = denoise::prepare(
        vec![0.1; 5],
        &ReceptiveField::new(10, 5),
        4,
        PadMode::Reflect,
    );
    assert_eq!(decision.samples().len(), 11);
    assert_eq!(&decision.samples()[..5], &[0.1; 5]);
}

#[test]
fn length_sweep_against_one_sided_pad_never_reaches_inference_unsafely() {
    // Single-sided pad layer of 20, pad_sum 40: sweep input lengths 1..=42.
    let receptive = ReceptiveField::new(40, 20);
    let (pipeline, engine, handle) = build_pipeline(
        receptive,
        PipelineConfig {
            min_input_length: 16,
            ..Default::default()
        },
    );
    pipeline.start_stream().unwrap();

    for len in 1..=42usize {
        let input = pcm::i16_to_bytes(&vec![500i16; len]);
        let output = handle.push_frame(&input).expect("stream should be open");
        // The callback always answers with a same-length frame.
        assert_eq!(output.len(), input.len(), "len {}", len);
    }

    // Everything at or below pad_sum=40 must have been padded to >= 41;
    // the ProbeDenoiser asserts the per-side floor internally.
    let seen = engine.seen_lengths.lock().unwrap();
    assert!(seen.iter().all(|&n| n >= 41));
    // len 1 bypassed, the rest ran inference
    assert_eq!(engine.calls.load(Ordering::SeqCst), 41);

    pipeline.stop_stream().unwrap();
}

#[test]
fn inference_failure_degrades_to_silence_and_stream_survives() {
    let (pipeline, engine, handle) =
        build_pipeline(ReceptiveField::default(), PipelineConfig::default());
    pipeline.start_stream().unwrap();

    let input = pcm::i16_to_bytes(&vec![3000i16; 320]);

    engine.fail.store(true, Ordering::SeqCst);
    let output = handle.push_frame(&input).expect("stream should be open");
    assert_eq!(output.len(), input.len());
    assert!(
        pcm::bytes_to_i16(&output).iter().all(|&s| s == 0),
        "failed frame must be emitted as silence"
    );
    assert!(pipeline.is_streaming(), "stream must stay up after a failure");

    // The next frame processes normally.
    engine.fail.store(false, Ordering::SeqCst);
    let output = handle.push_frame(&input).expect("stream should be open");
    assert_eq!(pcm::bytes_to_i16(&output), vec![3000i16; 320]);

    assert_eq!(pipeline.processor().stats().silenced, 1);
    pipeline.stop_stream().unwrap();
}

#[test]
fn sub_two_sample_frames_bypass_and_round_trip_exactly() {
    let (pipeline, engine, handle) =
        build_pipeline(ReceptiveField::new(10, 5), PipelineConfig::default());
    pipeline.start_stream().unwrap();

    for samples in [vec![], vec![-12345i16]] {
        let input = pcm::i16_to_bytes(&samples);
        let output = handle.push_frame(&input).expect("stream should be open");
        assert_eq!(pcm::bytes_to_i16(&output), samples);
    }
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    assert_eq!(pipeline.processor().stats().bypassed, 2);

    pipeline.stop_stream().unwrap();
}

#[test]
fn denoise_toggle_switches_between_processing_and_passthrough() {
    let (pipeline, engine, handle) = build_pipeline(
        ReceptiveField::default(),
        PipelineConfig {
            denoise_enabled: false,
            ..Default::default()
        },
    );
    pipeline.start_stream().unwrap();

    let input = pcm::i16_to_bytes(&vec![250i16; 320]);
    let output = handle.push_frame(&input).expect("stream should be open");
    assert_eq!(output, input);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);

    pipeline.processor().set_denoise_enabled(true);
    let _ = handle.push_frame(&input).expect("stream should be open");
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);

    pipeline.stop_stream().unwrap();
}

#[test]
fn state_machine_rejects_double_start_and_tolerates_double_stop() {
    let (pipeline, _engine, _handle) =
        build_pipeline(ReceptiveField::default(), PipelineConfig::default());

    assert!(pipeline.stop_stream().is_ok()); // stop while idle: no-op

    pipeline.start_stream().unwrap();
    assert!(matches!(
        pipeline.start_stream(),
        Err(HushmicError::AlreadyStreaming)
    ));

    pipeline.stop_stream().unwrap();
    assert!(pipeline.stop_stream().is_ok());

    // A full second cycle works.
    pipeline.start_stream().unwrap();
    pipeline.stop_stream().unwrap();
}

#[test]
fn queue_sink_receives_frames_in_capture_order() {
    let (sink, rx) = hushmic::sink::QueueSink::with_capacity(16);
    let engine = Arc::new(ProbeDenoiser::new(ReceptiveField::default()));
    let processor = Arc::new(FrameProcessor::new(
        engine as Arc<dyn Denoiser>,
        PipelineConfig::default(),
        vec![Box::new(sink)],
    ));

    for value in [1i16, 2, 3] {
        processor.process_frame(&pcm::i16_to_bytes(&vec![value; 320]));
    }

    for expected in [1i16, 2, 3] {
        let frame = rx.try_recv().expect("frame should be queued");
        assert_eq!(pcm::bytes_to_i16(&frame), vec![expected; 320]);
    }
}
