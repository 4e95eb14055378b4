//! Model loading, receptive-field analysis, and frame preparation.

pub mod engine;
pub mod preparer;
pub mod receptive;

pub use engine::{DenoiseEngine, Denoiser, EngineOptions};
pub use preparer::{PadMode, PrepareDecision, pad_floor, prepare};
pub use receptive::ReceptiveField;
