//! ONNX denoising inference via tract.
//!
//! The engine is a pure frame-in/frame-out transform: it loads a model
//! file once, derives the receptive-field requirement from the typed
//! graph, and runs one forward pass per call. It holds no audio-timing
//! knowledge and performs no padding; callers go through the frame
//! preparer first.

use crate::defaults;
use crate::denoise::receptive::{self, ReceptiveField};
use crate::error::{HushmicError, Result};
use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;
use tract_onnx::tract_core::transform::get_transform;

/// A runnable tract plan (optimized for repeated inference).
pub type RunnablePlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Single-frame denoising transform.
///
/// Trait seam between the pipeline and the concrete model backend, so the
/// pipeline can be exercised with mock models in tests.
pub trait Denoiser: Send + Sync {
    /// Padding requirement derived at load time; constant thereafter.
    fn receptive_field(&self) -> ReceptiveField;

    /// Run the forward pass on one prepared frame.
    ///
    /// Precondition (enforced by the frame preparer, not re-checked here):
    /// the frame is longer than the model's largest one-sided pad.
    fn process(&self, frame: &[f32]) -> Result<Vec<f32>>;
}

/// Load-time options.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Floor applied when the model exposes no padding layers.
    pub forced_min_input_length: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            forced_min_input_length: defaults::FORCED_MIN_INPUT_LENGTH,
        }
    }
}

/// One loaded denoising model plus its derived padding requirement.
///
/// Immutable once loaded; `quantize` produces a new engine and leaves the
/// original valid. Dropping the engine releases all backing memory.
pub struct DenoiseEngine {
    path: PathBuf,
    typed: TypedModel,
    plan: RunnablePlan,
    receptive: ReceptiveField,
    options: EngineOptions,
    quantized: bool,
}

impl DenoiseEngine {
    /// Load an ONNX model from `path` and derive its padding requirement.
    ///
    /// # Errors
    /// `ModelNotFound` when the file does not exist; `ModelLoadFailure`
    /// when tract cannot parse or type the graph.
    pub fn load(path: &Path, options: EngineOptions) -> Result<Self> {
        if !path.exists() {
            return Err(HushmicError::ModelNotFound {
                path: path.display().to_string(),
            });
        }

        let load_failure = |e: TractError| HushmicError::ModelLoadFailure {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        let typed = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(load_failure)?
            .into_typed()
            .map_err(load_failure)?;

        // Padding discovery happens on the un-optimized graph; optimization
        // may fuse pad ops away.
        let receptive = receptive::analyze(&typed);

        let plan = typed
            .clone()
            .into_optimized()
            .map_err(load_failure)?
            .into_runnable()
            .map_err(load_failure)?;

        Ok(Self {
            path: path.to_path_buf(),
            typed,
            plan,
            receptive,
            options,
            quantized: false,
        })
    }

    /// Produce a half-precision copy of this engine for CPU throughput.
    ///
    /// The original engine stays valid until dropped.
    ///
    /// # Errors
    /// `QuantizationUnsupported` when the f16 transform is unavailable or
    /// rejects this graph.
    pub fn quantize(&self) -> Result<Self> {
        let transform =
            get_transform("f32-to-f16").ok_or_else(|| HushmicError::QuantizationUnsupported {
                message: "f32-to-f16 transform not available".to_string(),
            })?;

        let mut typed = self.typed.clone();
        transform
            .transform(&mut typed)
            .map_err(|e| HushmicError::QuantizationUnsupported {
                message: e.to_string(),
            })?;

        let plan = typed
            .clone()
            .into_optimized()
            .and_then(|m| m.into_runnable())
            .map_err(|e| HushmicError::QuantizationUnsupported {
                message: e.to_string(),
            })?;

        Ok(Self {
            path: self.path.clone(),
            typed,
            plan,
            receptive: self.receptive,
            options: self.options.clone(),
            quantized: true,
        })
    }

    pub fn is_quantized(&self) -> bool {
        self.quantized
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The input-length floor the preparer must enforce for this model.
    pub fn effective_min_input(&self, configured_min: usize) -> usize {
        self.receptive
            .effective_min_input(configured_min, self.options.forced_min_input_length)
    }

    fn run_plan(&self, frame: &[f32]) -> TractResult<Vec<f32>> {
        let fact = self.plan.model().input_fact(0)?;

        // Shape the frame to the graph's declared input rank: bare samples,
        // [batch, time], or [batch, channel, time].
        let input: Tensor = match fact.shape.rank() {
            1 => tract_ndarray::Array1::from_vec(frame.to_vec()).into(),
            2 => tract_ndarray::Array2::from_shape_vec((1, frame.len()), frame.to_vec())?.into(),
            _ => {
                tract_ndarray::Array3::from_shape_vec((1, 1, frame.len()), frame.to_vec())?.into()
            }
        };

        // Quantized plans expect f16 inputs; cast to whatever the graph
        // declares rather than assuming f32.
        let wanted = fact.datum_type;
        let input = if input.datum_type() == wanted {
            input
        } else {
            input.cast_to_dt(wanted)?.into_owned()
        };

        let outputs = self.plan.run(tvec!(input.into()))?;
        let denoised = outputs[0].cast_to::<f32>()?;
        Ok(denoised.to_array_view::<f32>()?.iter().copied().collect())
    }
}

impl Denoiser for DenoiseEngine {
    fn receptive_field(&self) -> ReceptiveField {
        self.receptive
    }

    fn process(&self, frame: &[f32]) -> Result<Vec<f32>> {
        self.run_plan(frame)
            .map_err(|e| HushmicError::InferenceFailure {
                message: e.to_string(),
            })
    }
}
