//! Stream parameters and the duplex-audio seam.
//!
//! The pipeline talks to the platform audio subsystem through the
//! `DuplexAudio` trait: open a full-duplex stream with a registered frame
//! callback, close it again. The cpal implementation lives in
//! `audio::duplex`; `MockDuplex` lets tests drive the callback by hand.

use crate::defaults;
use crate::error::{HushmicError, Result};
use std::sync::{Arc, Mutex};

/// Frame callback registered with the audio layer.
///
/// Invoked once per hardware buffer period with the captured frame bytes;
/// must return the output frame bytes within the same invocation and never
/// panic past its boundary.
pub type FrameCallback = Arc<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

/// Validated parameters for one audio stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamParams {
    pub sample_rate: u32,
    pub buffer_ms: u32,
    pub channels: u16,
    pub input_device: Option<String>,
    pub output_device: Option<String>,
}

impl StreamParams {
    /// Validate and construct stream parameters.
    ///
    /// # Errors
    /// `ConfigInvalidValue` for a zero sample rate, buffer size, or channel
    /// count, or for a combination that yields an empty frame. Invalid
    /// values are rejected, never silently defaulted.
    pub fn new(
        sample_rate: u32,
        buffer_ms: u32,
        channels: u16,
        input_device: Option<String>,
        output_device: Option<String>,
    ) -> Result<Self> {
        if sample_rate == 0 {
            return Err(HushmicError::ConfigInvalidValue {
                key: "sample_rate".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if buffer_ms == 0 {
            return Err(HushmicError::ConfigInvalidValue {
                key: "buffer_ms".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if channels == 0 {
            return Err(HushmicError::ConfigInvalidValue {
                key: "channels".to_string(),
                message: "must be positive".to_string(),
            });
        }
        let params = Self {
            sample_rate,
            buffer_ms,
            channels,
            input_device,
            output_device,
        };
        if params.frame_len() == 0 {
            return Err(HushmicError::ConfigInvalidValue {
                key: "buffer_ms".to_string(),
                message: format!(
                    "{}ms at {}Hz yields an empty frame",
                    buffer_ms, sample_rate
                ),
            });
        }
        Ok(params)
    }

    /// Samples per frame per channel.
    pub fn frame_len(&self) -> usize {
        (self.sample_rate as u64 * self.buffer_ms as u64 / 1000) as usize
    }

    /// Total interleaved samples per frame across channels.
    pub fn samples_per_frame(&self) -> usize {
        self.frame_len() * self.channels as usize
    }

    /// Frame size in bytes at the 16-bit PCM boundary.
    pub fn bytes_per_frame(&self) -> usize {
        self.samples_per_frame() * 2
    }
}

impl Default for StreamParams {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            buffer_ms: defaults::BUFFER_MS,
            channels: defaults::CHANNELS,
            input_device: None,
            output_device: None,
        }
    }
}

/// Full-duplex audio backend seam.
///
/// `open` registers the callback and starts periodic invocation; `close`
/// returns only after the platform guarantees no further invocations.
pub trait DuplexAudio: Send {
    fn open(&mut self, params: &StreamParams, callback: FrameCallback) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

/// Test double: captures the registered callback so tests can push frames
/// through it synchronously.
#[derive(Default)]
pub struct MockDuplex {
    callback: Arc<Mutex<Option<FrameCallback>>>,
    fail_open: bool,
}

impl MockDuplex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_open_failure(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Handle for invoking the registered callback from a test.
    pub fn handle(&self) -> MockDuplexHandle {
        MockDuplexHandle {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl DuplexAudio for MockDuplex {
    fn open(&mut self, _params: &StreamParams, callback: FrameCallback) -> Result<()> {
        if self.fail_open {
            return Err(HushmicError::AudioStream {
                message: "mock open failure".to_string(),
            });
        }
        let mut slot = self.callback.lock().map_err(|e| HushmicError::AudioStream {
            message: format!("Failed to lock mock callback: {}", e),
        })?;
        *slot = Some(callback);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut slot = self.callback.lock().map_err(|e| HushmicError::AudioStream {
            message: format!("Failed to lock mock callback: {}", e),
        })?;
        *slot = None;
        Ok(())
    }
}

/// Cloneable driver for a `MockDuplex` stream.
#[derive(Clone)]
pub struct MockDuplexHandle {
    callback: Arc<Mutex<Option<FrameCallback>>>,
}

impl MockDuplexHandle {
    /// Invoke the registered callback as the platform would.
    ///
    /// Returns `None` when no stream is open.
    pub fn push_frame(&self, input: &[u8]) -> Option<Vec<u8>> {
        let slot = self.callback.lock().ok()?;
        slot.as_ref().map(|cb| cb(input))
    }

    pub fn is_open(&self) -> bool {
        self.callback
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }
}
