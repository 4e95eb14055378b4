//! The frame-processing pipeline.
//!
//! `FrameProcessor` is the per-frame cycle: decode, prepare, infer, encode,
//! fan out to sinks. It runs inside the platform's realtime audio callback,
//! so every failure degrades to bypass or silence instead of propagating,
//! and the callback always returns a frame of the length it received.
//!
//! `AudioPipeline` owns the processor, the duplex backend, and the stream
//! lifecycle (`Idle -> Streaming -> Idle`).

pub mod stats;

use crate::audio::pcm;
use crate::audio::stream::{DuplexAudio, FrameCallback, StreamParams};
use crate::defaults;
use crate::denoise::preparer::{self, PadMode, PrepareDecision};
use crate::denoise::receptive::ReceptiveField;
use crate::denoise::Denoiser;
use crate::error::{HushmicError, Result};
use crate::sink::DeviceSink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

pub use stats::{PipelineStats, StatsSnapshot};

/// Pipeline tuning knobs, resolved once at construction.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// General usability floor for model input length.
    pub min_input_length: usize,
    /// Fallback floor when the model exposes no padding layers.
    pub forced_min_input_length: usize,
    /// Fill used by the usability-minimum padding branch.
    pub pad_mode: PadMode,
    /// Initial state of the denoise toggle (A/B bypass).
    pub denoise_enabled: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_input_length: defaults::MIN_INPUT_LENGTH,
            forced_min_input_length: defaults::FORCED_MIN_INPUT_LENGTH,
            pad_mode: PadMode::default(),
            denoise_enabled: true,
        }
    }
}

/// The per-frame capture→prepare→infer→emit cycle.
///
/// Shared (via `Arc`) between the control thread and the audio callback.
pub struct FrameProcessor {
    engine: Arc<dyn Denoiser>,
    receptive: ReceptiveField,
    min_input_length: usize,
    pad_mode: PadMode,
    enabled: AtomicBool,
    sinks: Vec<Box<dyn DeviceSink>>,
    stats: PipelineStats,
}

impl FrameProcessor {
    pub fn new(
        engine: Arc<dyn Denoiser>,
        config: PipelineConfig,
        sinks: Vec<Box<dyn DeviceSink>>,
    ) -> Self {
        let receptive = engine.receptive_field();
        let min_input_length =
            receptive.effective_min_input(config.min_input_length, config.forced_min_input_length);
        Self {
            engine,
            receptive,
            min_input_length,
            pad_mode: config.pad_mode,
            enabled: AtomicBool::new(config.denoise_enabled),
            sinks,
            stats: PipelineStats::default(),
        }
    }

    /// Toggle the denoising step at runtime (A/B comparison). Capture and
    /// sink fan-out keep running either way.
    pub fn set_denoise_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn denoise_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// The effective input-length floor in force for the loaded model.
    pub fn min_input_length(&self) -> usize {
        self.min_input_length
    }

    /// Process one captured frame and return the frame to play back.
    ///
    /// Total: every failure inside degrades to raw passthrough or silence
    /// of the same length. The output byte length always equals the input
    /// byte length (modulo a trailing odd byte, which no conforming
    /// platform produces).
    pub fn process_frame(&self, input: &[u8]) -> Vec<u8> {
        self.stats.record_frame();

        let samples = pcm::decode_frame(input);
        let frame_len = samples.len();

        let output = if !self.enabled.load(Ordering::Relaxed) {
            samples
        } else {
            match preparer::prepare(samples, &self.receptive, self.min_input_length, self.pad_mode)
            {
                PrepareDecision::Bypass(original) => {
                    self.stats.record_bypass();
                    original
                }
                PrepareDecision::RunAsIs(frame) => self.run_inference(frame, frame_len),
                PrepareDecision::PadAndRun(frame) => {
                    self.stats.record_padded();
                    self.run_inference(frame, frame_len)
                }
            }
        };

        let bytes = pcm::encode_frame(&fit_length(output, frame_len));
        self.deliver_to_sinks(&bytes);
        bytes
    }

    fn run_inference(&self, frame: Vec<f32>, frame_len: usize) -> Vec<f32> {
        match self.engine.process(&frame) {
            Ok(denoised) => denoised,
            Err(e) => {
                // One bad frame becomes silence; the stream keeps going.
                self.stats.record_silenced();
                if self.stats.snapshot().silenced == 1 {
                    eprintln!("hushmic: inference failed, emitting silence: {}", e);
                }
                vec![0.0; frame_len]
            }
        }
    }

    fn deliver_to_sinks(&self, frame: &[u8]) {
        for sink in &self.sinks {
            if let Err(e) = sink.deliver(frame) {
                self.stats.record_sink_failure();
                if self.stats.snapshot().sink_failures == 1 {
                    eprintln!("hushmic: sink '{}' failed: {}", sink.name(), e);
                }
            }
        }
    }
}

/// Trim or zero-extend the model output to the captured frame length.
///
/// Prepared inputs are never truncated, but a padded input can make the
/// model return more samples than were captured; the platform expects
/// exactly as many as it delivered.
fn fit_length(mut samples: Vec<f32>, frame_len: usize) -> Vec<f32> {
    if samples.len() > frame_len {
        samples.truncate(frame_len);
    } else if samples.len() < frame_len {
        samples.resize(frame_len, 0.0);
    }
    samples
}

/// One open device session.
#[derive(Debug)]
pub struct StreamSession {
    pub params: StreamParams,
    pub started_at: Instant,
}

/// Owns the stream lifecycle around a `FrameProcessor`.
///
/// State machine: `Idle -> Streaming -> Idle`, nothing in between. The
/// session slot doubles as the state: `Some` means streaming.
pub struct AudioPipeline {
    processor: Arc<FrameProcessor>,
    backend: Mutex<Box<dyn DuplexAudio>>,
    params: Mutex<StreamParams>,
    session: Mutex<Option<StreamSession>>,
}

impl AudioPipeline {
    pub fn new(
        processor: Arc<FrameProcessor>,
        backend: Box<dyn DuplexAudio>,
        params: StreamParams,
    ) -> Self {
        Self {
            processor,
            backend: Mutex::new(backend),
            params: Mutex::new(params),
            session: Mutex::new(None),
        }
    }

    pub fn processor(&self) -> &Arc<FrameProcessor> {
        &self.processor
    }

    pub fn is_streaming(&self) -> bool {
        self.session
            .lock()
            .map(|session| session.is_some())
            .unwrap_or(false)
    }

    /// Current stream parameters.
    pub fn params(&self) -> Result<StreamParams> {
        Ok(self.lock_params()?.clone())
    }

    /// Replace device/stream parameters.
    ///
    /// # Errors
    /// `InvalidStateTransition` while streaming: device selection is only
    /// mutable from the control thread while idle. No partial mutation
    /// occurs on rejection.
    pub fn set_params(&self, params: StreamParams) -> Result<()> {
        let session = self.lock_session()?;
        if session.is_some() {
            return Err(HushmicError::InvalidStateTransition {
                message: "cannot change stream parameters while streaming".to_string(),
            });
        }
        *self.lock_params()? = params;
        Ok(())
    }

    /// Open the duplex stream and begin per-frame processing.
    ///
    /// # Errors
    /// `AlreadyStreaming` when a session is active; backend errors when the
    /// stream cannot be opened (the state stays `Idle` in that case).
    pub fn start_stream(&self) -> Result<()> {
        let mut session = self.lock_session()?;
        if session.is_some() {
            return Err(HushmicError::AlreadyStreaming);
        }

        let params = self.lock_params()?.clone();
        let processor = Arc::clone(&self.processor);
        let callback: FrameCallback = Arc::new(move |bytes| processor.process_frame(bytes));

        self.lock_backend()?.open(&params, callback)?;
        *session = Some(StreamSession {
            params,
            started_at: Instant::now(),
        });
        Ok(())
    }

    /// Stop streaming and release the session.
    ///
    /// Safe to call while a callback invocation is in flight: the backend's
    /// `close` returns only after the platform guarantees no further
    /// invocations. Calling while idle is a successful no-op.
    pub fn stop_stream(&self) -> Result<()> {
        let mut session = self.lock_session()?;
        if session.is_none() {
            return Ok(());
        }
        self.lock_backend()?.close()?;
        *session = None;
        Ok(())
    }

    fn lock_session(&self) -> Result<std::sync::MutexGuard<'_, Option<StreamSession>>> {
        self.session.lock().map_err(|e| HushmicError::AudioStream {
            message: format!("Failed to lock session: {}", e),
        })
    }

    fn lock_params(&self) -> Result<std::sync::MutexGuard<'_, StreamParams>> {
        self.params.lock().map_err(|e| HushmicError::AudioStream {
            message: format!("Failed to lock params: {}", e),
        })
    }

    fn lock_backend(&self) -> Result<std::sync::MutexGuard<'_, Box<dyn DuplexAudio>>> {
        self.backend.lock().map_err(|e| HushmicError::AudioStream {
            message: format!("Failed to lock backend: {}", e),
        })
    }
}

/// Run samples through the processor in fixed-size frames (offline mode).
///
/// The trailing partial frame goes through the same path, exercising the
/// preparer exactly as a short hardware buffer would.
pub fn process_offline(processor: &FrameProcessor, samples: &[i16], frame_len: usize) -> Vec<i16> {
    let mut output = Vec::with_capacity(samples.len());
    for chunk in samples.chunks(frame_len.max(1)) {
        let bytes = processor.process_frame(&pcm::i16_to_bytes(chunk));
        output.extend(pcm::bytes_to_i16(&bytes));
    }
    output
}
