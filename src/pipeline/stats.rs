//! Per-stream observability counters.
//!
//! Degraded frames (bypassed, padded, silenced) must be distinguishable
//! from normal operation without interrupting playback, so the callback
//! only bumps atomic counters; rendering happens on the control thread.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated from the audio callback.
#[derive(Debug, Default)]
pub struct PipelineStats {
    frames: AtomicU64,
    bypassed: AtomicU64,
    padded: AtomicU64,
    silenced: AtomicU64,
    sink_failures: AtomicU64,
}

impl PipelineStats {
    pub fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bypass(&self) {
        self.bypassed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_padded(&self) {
        self.padded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_silenced(&self) {
        self.silenced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
            padded: self.padded.load(Ordering::Relaxed),
            silenced: self.silenced.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames: u64,
    pub bypassed: u64,
    pub padded: u64,
    pub silenced: u64,
    pub sink_failures: u64,
}

impl StatsSnapshot {
    /// One-line summary for the end-of-stream report.
    pub fn summary(&self) -> String {
        format!(
            "{} frames processed ({} bypassed, {} padded, {} silenced, {} sink failures)",
            self.frames, self.bypassed, self.padded, self.silenced, self.sink_failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let stats = PipelineStats::default();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames, 0);
        assert_eq!(snapshot.bypassed, 0);
        assert_eq!(snapshot.padded, 0);
        assert_eq!(snapshot.silenced, 0);
        assert_eq!(snapshot.sink_failures, 0);
    }

    #[test]
    fn counters_accumulate() {
        let stats = PipelineStats::default();
        stats.record_frame();
        stats.record_frame();
        stats.record_bypass();
        stats.record_silenced();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames, 2);
        assert_eq!(snapshot.bypassed, 1);
        assert_eq!(snapshot.silenced, 1);
    }

    #[test]
    fn summary_mentions_every_counter() {
        let stats = PipelineStats::default();
        stats.record_frame();
        stats.record_padded();
        let summary = stats.snapshot().summary();
        assert!(summary.contains("1 frames processed"));
        assert!(summary.contains("1 padded"));
        assert!(summary.contains("0 silenced"));
    }
}
