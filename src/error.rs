//! Error types for hushmic.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HushmicError {
    // Configuration errors
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio device errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio stream error: {message}")]
    AudioStream { message: String },

    // Model errors
    #[error("Unknown model: {name}")]
    UnknownModel { name: String },

    #[error("Denoising model not found at {path}")]
    ModelNotFound { path: String },

    #[error("Failed to load denoising model from {path}: {message}")]
    ModelLoadFailure { path: String, message: String },

    #[error("Model quantization unsupported: {message}")]
    QuantizationUnsupported { message: String },

    #[error("Denoising inference failed: {message}")]
    InferenceFailure { message: String },

    // Stream state errors
    #[error("Stream is already running")]
    AlreadyStreaming,

    #[error("Invalid state transition: {message}")]
    InvalidStateTransition { message: String },

    // Virtual microphone errors
    #[error("Virtual microphone is not supported on this platform")]
    VirtualMicUnsupported,

    #[error("Virtual microphone error: {message}")]
    VirtualMic { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, HushmicError>;
