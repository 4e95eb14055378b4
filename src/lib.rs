//! hushmic - Real-time speech denoising for the microphone
//!
//! Captures microphone audio in small fixed-size frames, runs a learned
//! noise-suppression model over each frame inside the realtime callback,
//! and emits the cleaned audio to playback and/or a virtual microphone.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod denoise;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod sink;

// Composition root - needs the cpal backend and the CLI surface
#[cfg(all(feature = "cpal-audio", feature = "cli"))]
pub mod app;

// Core seams (capture → prepare → infer → emit)
pub use audio::stream::{DuplexAudio, FrameCallback, MockDuplex, StreamParams};
pub use denoise::{DenoiseEngine, Denoiser, EngineOptions, PadMode, PrepareDecision, ReceptiveField};
pub use pipeline::{AudioPipeline, FrameProcessor, PipelineConfig};
pub use sink::DeviceSink;

// Error handling
pub use error::{HushmicError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.3.1+abc1234"` when git hash is available, `"0.3.1"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
