use crate::defaults;
use crate::denoise::PadMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub denoise: DenoiseConfig,
    pub virtual_mic: VirtualMicConfig,
}

/// Audio stream configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub input_device: Option<String>,
    pub output_device: Option<String>,
    pub sample_rate: u32,
    pub buffer_ms: u32,
    pub channels: u16,
}

/// Denoising configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DenoiseConfig {
    /// Catalog model name (ignored when `model_path` is set).
    pub model: String,
    /// Explicit path to an ONNX model file.
    pub model_path: Option<PathBuf>,
    /// Quantize weights to f16 after loading.
    pub quantize: bool,
    /// Initial state of the denoising toggle.
    pub enabled: bool,
    /// General usability floor for model input length.
    pub min_input_length: usize,
    /// Floor applied when the model exposes no padding layers.
    pub forced_min_input_length: usize,
    /// Fill for the usability-minimum padding branch: "reflect" or "zeros".
    pub pad_mode: PadMode,
}

/// Virtual microphone configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VirtualMicConfig {
    pub enabled: bool,
    /// Override for the named-pipe location (Linux backend).
    pub fifo_path: Option<PathBuf>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            input_device: None,
            output_device: None,
            sample_rate: defaults::SAMPLE_RATE,
            buffer_ms: defaults::BUFFER_MS,
            channels: defaults::CHANNELS,
        }
    }
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            model_path: None,
            quantize: false,
            enabled: true,
            min_input_length: defaults::MIN_INPUT_LENGTH,
            forced_min_input_length: defaults::FORCED_MIN_INPUT_LENGTH,
            pad_mode: PadMode::default(),
        }
    }
}

impl Default for VirtualMicConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            fifo_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - HUSHMIC_MODEL → denoise.model
    /// - HUSHMIC_MODEL_PATH → denoise.model_path
    /// - HUSHMIC_INPUT_DEVICE → audio.input_device
    /// - HUSHMIC_OUTPUT_DEVICE → audio.output_device
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("HUSHMIC_MODEL")
            && !model.is_empty()
        {
            self.denoise.model = model;
        }

        if let Ok(path) = std::env::var("HUSHMIC_MODEL_PATH")
            && !path.is_empty()
        {
            self.denoise.model_path = Some(PathBuf::from(path));
        }

        if let Ok(device) = std::env::var("HUSHMIC_INPUT_DEVICE")
            && !device.is_empty()
        {
            self.audio.input_device = Some(device);
        }

        if let Ok(device) = std::env::var("HUSHMIC_OUTPUT_DEVICE")
            && !device.is_empty()
        {
            self.audio.output_device = Some(device);
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/hushmic/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("hushmic")
            .join("config.toml")
    }
}
