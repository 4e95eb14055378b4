//! Receptive-field analysis of a loaded model graph.
//!
//! Denoising models built from convolutional stacks usually apply edge
//! padding (often reflect padding) internally. Feeding them a frame shorter
//! than that padding makes the pad operation itself underflow. This module
//! scans the typed layer graph once at load time and derives the minimum
//! input-length requirement; nothing here runs in the per-frame path.

use tract_onnx::prelude::*;
use tract_onnx::tract_core::ops::array::{Pad, PadMode as TractPadMode};

/// Padding requirement derived from a model's layer graph.
///
/// `pad_sum` is the largest total (leading + trailing) pad any single layer
/// applies; `max_single_pad` is the largest one-sided pad across all layers.
/// `pad_sum >= max_single_pad` holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReceptiveField {
    pub pad_sum: usize,
    pub max_single_pad: usize,
}

impl ReceptiveField {
    pub fn new(pad_sum: usize, max_single_pad: usize) -> Self {
        debug_assert!(pad_sum >= max_single_pad);
        Self {
            pad_sum,
            max_single_pad,
        }
    }

    /// True when the graph exposed no padding layers at all.
    pub fn is_unconstrained(&self) -> bool {
        self.pad_sum == 0 && self.max_single_pad == 0
    }

    /// The minimum input length the frame preparer must enforce.
    ///
    /// When the model exposes no padding layers, `forced_min` (a
    /// caller-supplied fallback) becomes the authoritative floor.
    pub fn effective_min_input(&self, configured_min: usize, forced_min: usize) -> usize {
        if self.is_unconstrained() {
            configured_min.max(forced_min)
        } else {
            configured_min
        }
    }
}

/// One padding layer found in the graph, kept for diagnostics.
#[derive(Debug, Clone)]
pub struct PaddingLayer {
    pub node_name: String,
    pub before: usize,
    pub after: usize,
    pub mode: &'static str,
}

/// Scan a typed model graph for `Pad` operations.
pub fn padding_layers(model: &TypedModel) -> Vec<PaddingLayer> {
    let mut layers = Vec::new();
    for node in model.nodes() {
        if let Some(pad) = node.op_as::<Pad>() {
            // Pads are per-axis; the padded axis of a 1-D audio model is the
            // one with nonzero amounts (batch/channel axes pad by zero).
            let (before, after) = pad
                .pads
                .iter()
                .copied()
                .max_by_key(|&(b, a)| b + a)
                .unwrap_or((0, 0));
            if before + after == 0 {
                continue;
            }
            let mode = match pad.mode {
                TractPadMode::Constant(_) => "constant",
                TractPadMode::Reflect => "reflect",
                TractPadMode::Edge => "edge",
            };
            layers.push(PaddingLayer {
                node_name: node.name.clone(),
                before,
                after,
                mode,
            });
        }
    }
    layers
}

/// Derive the receptive-field requirement from the discovered pad layers.
pub fn analyze(model: &TypedModel) -> ReceptiveField {
    from_layers(&padding_layers(model))
}

pub(crate) fn from_layers(layers: &[PaddingLayer]) -> ReceptiveField {
    let pad_sum = layers
        .iter()
        .map(|l| l.before + l.after)
        .max()
        .unwrap_or(0);
    let max_single_pad = layers
        .iter()
        .map(|l| l.before.max(l.after))
        .max()
        .unwrap_or(0);
    ReceptiveField::new(pad_sum, max_single_pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(before: usize, after: usize) -> PaddingLayer {
        PaddingLayer {
            node_name: "pad".to_string(),
            before,
            after,
            mode: "reflect",
        }
    }

    #[test]
    fn no_layers_yields_unconstrained_requirement() {
        let rf = from_layers(&[]);
        assert_eq!(rf, ReceptiveField::default());
        assert!(rf.is_unconstrained());
    }

    #[test]
    fn symmetric_pad_layer() {
        let rf = from_layers(&[layer(5, 5)]);
        assert_eq!(rf.pad_sum, 10);
        assert_eq!(rf.max_single_pad, 5);
    }

    #[test]
    fn largest_layer_wins() {
        let rf = from_layers(&[layer(1, 1), layer(8, 8), layer(2, 0)]);
        assert_eq!(rf.pad_sum, 16);
        assert_eq!(rf.max_single_pad, 8);
    }

    #[test]
    fn asymmetric_pads_track_the_larger_side() {
        let rf = from_layers(&[layer(20, 0), layer(3, 12)]);
        assert_eq!(rf.pad_sum, 20);
        assert_eq!(rf.max_single_pad, 20);
        assert!(rf.pad_sum >= rf.max_single_pad);
    }

    #[test]
    fn effective_min_uses_forced_floor_only_when_unconstrained() {
        let unconstrained = ReceptiveField::default();
        assert_eq!(unconstrained.effective_min_input(16, 64), 64);
        assert_eq!(unconstrained.effective_min_input(100, 64), 100);

        let constrained = ReceptiveField::new(10, 5);
        assert_eq!(constrained.effective_min_input(16, 64), 16);
    }
}
