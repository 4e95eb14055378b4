//! Command-line interface for hushmic
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Real-time speech denoising for the microphone
#[derive(Parser, Debug)]
#[command(
    name = "hushmic",
    version,
    about = "Real-time speech denoising for the microphone"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: per-stream stats, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Audio capture device name (default: best available)
    #[arg(long, value_name = "DEVICE")]
    pub input_device: Option<String>,

    /// Audio playback device name (default: system default)
    #[arg(long, value_name = "DEVICE")]
    pub output_device: Option<String>,

    /// Denoising model from the catalog (default: silero)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Explicit path to an ONNX model file (overrides --model)
    #[arg(long, value_name = "PATH")]
    pub model_path: Option<PathBuf>,

    /// Audio sample rate in Hz (default: 16000)
    #[arg(long, value_name = "HZ")]
    pub sample_rate: Option<u32>,

    /// Buffer size in milliseconds (default: 20)
    #[arg(long, value_name = "MS")]
    pub buffer_ms: Option<u32>,

    /// Number of audio channels (default: 1)
    #[arg(long, value_name = "N")]
    pub channels: Option<u16>,

    /// Quantize model weights to f16 after loading
    #[arg(long)]
    pub quantize: bool,

    /// Start with denoising bypassed (raw passthrough for A/B comparison)
    #[arg(long)]
    pub no_denoise: bool,

    /// Relay denoised audio to a virtual microphone device
    #[arg(long)]
    pub virtual_mic: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio devices
    Devices,

    /// Manage denoising models
    Models {
        /// Action to perform
        #[command(subcommand)]
        action: ModelsAction,
    },

    /// Denoise a WAV file offline (no audio hardware needed)
    Process {
        /// Input WAV file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output WAV file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

/// Model management actions
#[derive(Subcommand, Debug)]
pub enum ModelsAction {
    /// List models in the catalog
    List,

    /// Show details for one model
    Info {
        /// Model name
        #[arg(value_name = "MODEL")]
        name: String,
    },
}

impl Cli {
    /// Fold CLI overrides into a loaded configuration.
    pub fn apply_to(&self, config: &mut crate::config::Config) {
        if let Some(device) = &self.input_device {
            config.audio.input_device = Some(device.clone());
        }
        if let Some(device) = &self.output_device {
            config.audio.output_device = Some(device.clone());
        }
        if let Some(model) = &self.model {
            config.denoise.model = model.clone();
        }
        if let Some(path) = &self.model_path {
            config.denoise.model_path = Some(path.clone());
        }
        if let Some(rate) = self.sample_rate {
            config.audio.sample_rate = rate;
        }
        if let Some(ms) = self.buffer_ms {
            config.audio.buffer_ms = ms;
        }
        if let Some(channels) = self.channels {
            config.audio.channels = channels;
        }
        if self.quantize {
            config.denoise.quantize = true;
        }
        if self.no_denoise {
            config.denoise.enabled = false;
        }
        if self.virtual_mic {
            config.virtual_mic.enabled = true;
        }
    }
}
