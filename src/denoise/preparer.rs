//! Frame preparation: make an arbitrary-length frame safe for inference.
//!
//! The capture layer hands the pipeline whatever the hardware produced:
//! normally a full buffer, but stream start/stop and device quirks can
//! deliver short frames. A frame shorter than the model's padding
//! requirement would make the model's own pad operation fail, so every
//! frame goes through `prepare` first: it is either passed through
//! untouched (too short to pad at all), padded up to a safe floor, or run
//! as-is.

use crate::denoise::receptive::ReceptiveField;
use serde::{Deserialize, Serialize};

/// How the usability-minimum padding branch fills appended samples.
///
/// The pad-sum branch always appends zeros; this only selects the fill for
/// frames that clear the model's pad floor but sit below the configured
/// minimum length. Reflect matches the convention of reflect-padding
/// models; which fill sounds better in that band is an open tuning
/// question, so it stays configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PadMode {
    #[default]
    Reflect,
    Zeros,
}

/// Outcome of preparing one frame.
///
/// Carries the (possibly extended) frame; the original samples are always
/// a prefix of the carried buffer. Produced fresh per frame, never stored.
#[derive(Debug, Clone, PartialEq)]
pub enum PrepareDecision {
    /// Frame is too short to pad safely; skip inference and emit it raw.
    Bypass(Vec<f32>),
    /// Frame was extended to a safe length; run inference on it.
    PadAndRun(Vec<f32>),
    /// Frame already satisfies every floor; run inference unmodified.
    RunAsIs(Vec<f32>),
}

impl PrepareDecision {
    pub fn samples(&self) -> &[f32] {
        match self {
            PrepareDecision::Bypass(s)
            | PrepareDecision::PadAndRun(s)
            | PrepareDecision::RunAsIs(s) => s,
        }
    }

    pub fn into_samples(self) -> Vec<f32> {
        match self {
            PrepareDecision::Bypass(s)
            | PrepareDecision::PadAndRun(s)
            | PrepareDecision::RunAsIs(s) => s,
        }
    }

    pub fn is_bypass(&self) -> bool {
        matches!(self, PrepareDecision::Bypass(_))
    }
}

/// The padding floor for a frame caught by the pad-sum branch: the maximum
/// of the usability minimum, the per-layer pad total plus one interior
/// sample, and the largest one-sided pad plus one. Different architectures
/// are bounded by different terms, so all three apply.
pub fn pad_floor(rf: &ReceptiveField, min_input_length: usize) -> usize {
    min_input_length
        .max(rf.pad_sum + 1)
        .max(rf.max_single_pad + 1)
}

/// Decide how one raw frame reaches the model.
///
/// Invariants:
/// - padding only appends, so the input samples are always a prefix of the
///   output samples;
/// - frames below two samples are never padded (no padding mode can
///   produce an interior sample from them) and bypass inference instead;
/// - the same input always yields a bit-identical decision.
pub fn prepare(
    frame: Vec<f32>,
    rf: &ReceptiveField,
    min_input_length: usize,
    pad_mode: PadMode,
) -> PrepareDecision {
    let len = frame.len();

    if len < 2 {
        return PrepareDecision::Bypass(frame);
    }

    if rf.pad_sum > 0 && len <= rf.pad_sum {
        let mut padded = frame;
        zero_pad(&mut padded, pad_floor(rf, min_input_length));
        return PrepareDecision::PadAndRun(padded);
    }

    if len < min_input_length {
        let mut padded = frame;
        match pad_mode {
            PadMode::Reflect => reflect_pad(&mut padded, min_input_length),
            PadMode::Zeros => zero_pad(&mut padded, min_input_length),
        }
        return PrepareDecision::PadAndRun(padded);
    }

    PrepareDecision::RunAsIs(frame)
}

fn zero_pad(samples: &mut Vec<f32>, target: usize) {
    if samples.len() < target {
        samples.resize(target, 0.0);
    }
}

/// Append edge-reflected samples (interior reflection, no edge duplicate)
/// until `target` is reached. Requires at least two samples; reflection
/// tiles with period `2 * (len - 1)` when more padding than one mirror
/// image is needed.
fn reflect_pad(samples: &mut Vec<f32>, target: usize) {
    let n = samples.len();
    debug_assert!(n >= 2);
    let period = 2 * (n - 1);
    for i in n..target {
        let pos = i % period;
        let idx = if pos < n { pos } else { period - pos };
        samples.push(samples[idx]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rf(pad_sum: usize, max_single_pad: usize) -> ReceptiveField {
        ReceptiveField::new(pad_sum, max_single_pad)
    }

    #[test]
    fn empty_frame_bypasses() {
        let decision = prepare(vec![], &rf(10, 5), 16, PadMode::Reflect);
        assert_eq!(decision, PrepareDecision::Bypass(vec![]));
    }

    #[test]
    fn single_sample_bypasses_unchanged() {
        let decision = prepare(vec![0.25], &rf(10, 5), 16, PadMode::Reflect);
        assert!(decision.is_bypass());
        assert_eq!(decision.samples(), &[0.25]);
    }

    #[test]
    fn frame_at_pad_sum_is_zero_padded_to_floor() {
        // len == pad_sum triggers the pad-sum branch
        let frame: Vec<f32> = (0..10).map(|i| i as f32 / 10.0).collect();
        let decision = prepare(frame.clone(), &rf(10, 5), 4, PadMode::Reflect);
        match decision {
            PrepareDecision::PadAndRun(padded) => {
                assert_eq!(padded.len(), 11); // pad_sum + 1 dominates
                assert_eq!(&padded[..10], frame.as_slice());
                assert!(padded[10..].iter().all(|&s| s == 0.0));
            }
            other => panic!("expected PadAndRun, got {:?}", other),
        }
    }

    #[test]
    fn pad_floor_takes_the_maximum_of_all_bounds() {
        assert_eq!(pad_floor(&rf(10, 5), 4), 11);
        assert_eq!(pad_floor(&rf(10, 5), 64), 64);
        assert_eq!(pad_floor(&rf(0, 0), 16), 16);
        // per-side bound can dominate when pads are lopsided
        assert_eq!(pad_floor(&rf(40, 40), 4), 41);
    }

    #[test]
    fn short_frame_below_min_is_reflect_padded() {
        let frame = vec![1.0, 2.0, 3.0];
        let decision = prepare(frame, &rf(0, 0), 6, PadMode::Reflect);
        match decision {
            PrepareDecision::PadAndRun(padded) => {
                // reflection of [1,2,3]: next samples mirror back 2,1 then forward 2
                assert_eq!(padded, vec![1.0, 2.0, 3.0, 2.0, 1.0, 2.0]);
            }
            other => panic!("expected PadAndRun, got {:?}", other),
        }
    }

    #[test]
    fn short_frame_below_min_zero_mode() {
        let frame = vec![1.0, 2.0];
        let decision = prepare(frame, &rf(0, 0), 5, PadMode::Zeros);
        assert_eq!(
            decision,
            PrepareDecision::PadAndRun(vec![1.0, 2.0, 0.0, 0.0, 0.0])
        );
    }

    #[test]
    fn reflect_pad_tiles_past_one_period() {
        let mut samples = vec![1.0, 2.0];
        reflect_pad(&mut samples, 7);
        // period 2: 1,2 -> 1,2 | 1,2 | 1,...
        assert_eq!(samples, vec![1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn long_frame_runs_as_is_without_copy_mutation() {
        let frame: Vec<f32> = (0..320).map(|i| (i as f32).sin()).collect();
        let expected = frame.clone();
        let decision = prepare(frame, &rf(10, 5), 16, PadMode::Reflect);
        match decision {
            PrepareDecision::RunAsIs(samples) => assert_eq!(samples, expected),
            other => panic!("expected RunAsIs, got {:?}", other),
        }
    }

    #[test]
    fn prepare_is_idempotent_for_fixed_inputs() {
        let frame = vec![0.5, -0.5, 0.25, -0.25, 0.125];
        let field = rf(10, 5);
        let a = prepare(frame.clone(), &field, 16, PadMode::Reflect);
        let b = prepare(frame, &field, 16, PadMode::Reflect);
        assert_eq!(a, b);
    }

    #[test]
    fn original_samples_are_always_a_prefix() {
        let frame = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        let decision = prepare(frame.clone(), &rf(10, 10), 16, PadMode::Reflect);
        assert_eq!(&decision.samples()[..frame.len()], frame.as_slice());
    }

    #[test]
    fn sweep_against_one_sided_pad_layer() {
        // Model with a single-sided pad of 20, pad_sum 40: every prepared
        // frame must reach at least 41 samples or bypass outright.
        let field = rf(40, 20);
        for len in 0..=42usize {
            let frame = vec![0.5; len];
            let decision = prepare(frame, &field, 16, PadMode::Reflect);
            if len < 2 {
                assert!(decision.is_bypass(), "len {} should bypass", len);
            } else if len <= 40 {
                assert!(
                    decision.samples().len() >= 41,
                    "len {} prepared to only {}",
                    len,
                    decision.samples().len()
                );
            } else {
                assert_eq!(decision.samples().len(), len);
            }
        }
    }

    // Deterministic xorshift so the fuzz run is reproducible.
    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.0 = x;
            x
        }

        fn below(&mut self, bound: u64) -> u64 {
            self.next() % bound
        }
    }

    #[test]
    fn fuzz_prepared_length_never_below_floor() {
        let mut rng = XorShift(0x9E3779B97F4A7C15);
        for _ in 0..1000 {
            let len = rng.below(201) as usize;
            let pad_sum = rng.below(100) as usize;
            let max_single_pad = if pad_sum == 0 {
                0
            } else {
                rng.below(pad_sum as u64 + 1) as usize
            };
            let min_input = rng.below(80) as usize;
            let field = rf(pad_sum, max_single_pad);

            let frame = vec![0.25; len];
            let decision = prepare(frame, &field, min_input, PadMode::Reflect);

            if len < 2 {
                assert!(decision.is_bypass());
                assert_eq!(decision.samples().len(), len);
            } else if pad_sum > 0 && len <= pad_sum {
                assert_eq!(decision.samples().len(), pad_floor(&field, min_input));
            } else {
                assert_eq!(decision.samples().len(), len.max(min_input));
            }
        }
    }
}
