//! Destinations for processed audio beyond primary playback.

pub mod virtual_mic;

use crate::error::Result;
use std::sync::{Arc, Mutex};

/// Pluggable output destination for processed frames.
///
/// Delivery is best-effort: the pipeline catches and counts failures, a
/// failing sink never affects the audio callback's return value. A
/// pipeline with zero sinks is a normal configuration.
pub trait DeviceSink: Send + Sync {
    /// Name for logging/debugging.
    fn name(&self) -> &'static str;

    /// Deliver one processed frame (16-bit PCM bytes).
    ///
    /// Must be non-blocking or bounded; implementations that hand frames
    /// to another thread queue them and return immediately.
    fn deliver(&self, frame: &[u8]) -> Result<()>;
}

/// Cross-thread sink: frames go into a bounded FIFO consumed elsewhere.
///
/// When the consumer lags and the queue fills up, the oldest frame is
/// dropped so `deliver` never blocks the audio thread.
pub struct QueueSink {
    tx: crossbeam_channel::Sender<Vec<u8>>,
    drop_rx: crossbeam_channel::Receiver<Vec<u8>>,
}

impl QueueSink {
    /// Create a sink and the receiver its consumer thread reads from.
    pub fn with_capacity(capacity: usize) -> (Self, crossbeam_channel::Receiver<Vec<u8>>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        let sink = Self {
            tx,
            drop_rx: rx.clone(),
        };
        (sink, rx)
    }
}

impl DeviceSink for QueueSink {
    fn name(&self) -> &'static str {
        "queue"
    }

    fn deliver(&self, frame: &[u8]) -> Result<()> {
        if let Err(crossbeam_channel::TrySendError::Full(frame)) = self.tx.try_send(frame.to_vec())
        {
            // Drop the oldest frame, keep the newest.
            let _ = self.drop_rx.try_recv();
            let _ = self.tx.try_send(frame);
        }
        Ok(())
    }
}

/// Collects delivered frames in memory; test helper.
#[derive(Default)]
pub struct CollectorSink {
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
    fail: bool,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the sink to fail every delivery.
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Shared handle to the collected frames.
    pub fn frames(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.frames)
    }
}

impl DeviceSink for CollectorSink {
    fn name(&self) -> &'static str {
        "collector"
    }

    fn deliver(&self, frame: &[u8]) -> Result<()> {
        if self.fail {
            return Err(crate::error::HushmicError::Other(
                "collector sink failure".to_string(),
            ));
        }
        if let Ok(mut frames) = self.frames.lock() {
            frames.push(frame.to_vec());
        }
        Ok(())
    }
}
