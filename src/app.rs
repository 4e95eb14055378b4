//! Application entry points.
//!
//! Wires together the configuration, model engine, sinks, and pipeline:
//! resolve model → load (→ quantize) → build sinks → stream until the user
//! stops, or run the same frame cycle over a WAV file offline.

use crate::audio::device::suppress_audio_warnings;
use crate::audio::duplex::CpalDuplex;
use crate::audio::stream::StreamParams;
use crate::audio::wav;
use crate::config::Config;
use crate::denoise::{DenoiseEngine, Denoiser, EngineOptions};
use crate::error::{HushmicError, Result};
use crate::models::catalog;
use crate::pipeline::{AudioPipeline, FrameProcessor, PipelineConfig, process_offline};
use crate::sink::virtual_mic::{VirtualMicService, VirtualMicSink};
use crate::sink::DeviceSink;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Resolve the configured model to a loadable file path.
///
/// An explicit `model_path` wins; otherwise the catalog's default path for
/// the named model is used. A missing file is an error, with manual
/// download instructions printed for catalog models.
fn resolve_model_path(config: &Config, quiet: bool) -> Result<PathBuf> {
    if let Some(path) = &config.denoise.model_path {
        if !path.exists() {
            return Err(HushmicError::ModelNotFound {
                path: path.display().to_string(),
            });
        }
        return Ok(path.clone());
    }

    let info =
        catalog::get_model(&config.denoise.model).ok_or_else(|| HushmicError::UnknownModel {
            name: config.denoise.model.clone(),
        })?;
    let path = PathBuf::from(info.default_path);
    if !path.exists() {
        if !quiet {
            eprintln!("{}", catalog::missing_model_message(info, &path));
        }
        return Err(HushmicError::ModelNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(path)
}

/// Load the engine per the configuration, applying optional quantization.
fn load_engine(config: &Config, quiet: bool) -> Result<DenoiseEngine> {
    let path = resolve_model_path(config, quiet)?;
    if !quiet {
        eprintln!("hushmic: loading model from {}...", path.display());
    }

    let options = EngineOptions {
        forced_min_input_length: config.denoise.forced_min_input_length,
    };
    let engine = DenoiseEngine::load(&path, options)?;

    if !config.denoise.quantize {
        return Ok(engine);
    }
    // Quantization is an optimization; fall back to the f32 engine when
    // this model cannot be converted.
    match engine.quantize() {
        Ok(quantized) => {
            if !quiet {
                eprintln!("hushmic: model quantized to f16");
            }
            Ok(quantized)
        }
        Err(e) => {
            eprintln!("hushmic: quantization skipped: {}", e);
            Ok(engine)
        }
    }
}

fn pipeline_config(config: &Config) -> PipelineConfig {
    PipelineConfig {
        min_input_length: config.denoise.min_input_length,
        forced_min_input_length: config.denoise.forced_min_input_length,
        pad_mode: config.denoise.pad_mode,
        denoise_enabled: config.denoise.enabled,
    }
}

/// Run the live denoising loop: microphone → model → playback (+ sinks).
///
/// Streams until the user presses Enter. Virtual-mic unavailability is
/// reported but never fatal.
pub fn run_denoise_command(config: Config, quiet: bool, verbosity: u8) -> Result<()> {
    // Suppress noisy JACK/ALSA warnings before audio init
    suppress_audio_warnings();

    let engine = load_engine(&config, quiet)?;
    let receptive = engine.receptive_field();
    if verbosity >= 1 {
        eprintln!(
            "hushmic: receptive field pad_sum={} max_single_pad={}",
            receptive.pad_sum, receptive.max_single_pad
        );
    }

    // Virtual microphone: lifecycle owned here, the pipeline only gets the
    // injected sink.
    let mut sinks: Vec<Box<dyn DeviceSink>> = Vec::new();
    let mut virtual_mic: Option<Arc<Mutex<VirtualMicService>>> = None;
    if config.virtual_mic.enabled {
        match VirtualMicService::platform_default(config.virtual_mic.fifo_path.clone()) {
            Ok(mut service) => {
                service.create()?;
                service.start()?;
                let service = Arc::new(Mutex::new(service));
                sinks.push(Box::new(VirtualMicSink::new(Arc::clone(&service))));
                virtual_mic = Some(service);
                if !quiet {
                    eprintln!("hushmic: virtual microphone relay enabled");
                }
            }
            Err(HushmicError::VirtualMicUnsupported) => {
                eprintln!(
                    "hushmic: virtual microphone not supported on this platform, continuing without it"
                );
            }
            Err(e) => return Err(e),
        }
    }

    let params = StreamParams::new(
        config.audio.sample_rate,
        config.audio.buffer_ms,
        config.audio.channels,
        config.audio.input_device.clone(),
        config.audio.output_device.clone(),
    )?;

    let processor = Arc::new(FrameProcessor::new(
        Arc::new(engine) as Arc<dyn Denoiser>,
        pipeline_config(&config),
        sinks,
    ));
    let pipeline = AudioPipeline::new(
        Arc::clone(&processor),
        Box::new(CpalDuplex::new()),
        params,
    );

    pipeline.start_stream()?;
    if !quiet {
        if processor.denoise_enabled() {
            eprintln!("hushmic: denoising... press Enter to stop.");
        } else {
            eprintln!("hushmic: passthrough (denoising bypassed)... press Enter to stop.");
        }
    }

    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);

    pipeline.stop_stream()?;

    if let Some(service) = virtual_mic
        && let Ok(mut service) = service.lock()
    {
        let _ = service.stop();
        let _ = service.destroy();
    }

    if !quiet {
        eprintln!("hushmic: {}", processor.stats().summary());
    }
    Ok(())
}

/// Denoise a WAV file through the identical per-frame cycle.
pub fn run_process_command(
    config: Config,
    input: &Path,
    output: &Path,
    quiet: bool,
) -> Result<()> {
    let engine = load_engine(&config, quiet)?;

    let reader = std::fs::File::open(input)?;
    let samples = wav::read_samples(std::io::BufReader::new(reader), config.audio.sample_rate)?;

    let params = StreamParams::new(
        config.audio.sample_rate,
        config.audio.buffer_ms,
        config.audio.channels,
        None,
        None,
    )?;

    let processor = FrameProcessor::new(
        Arc::new(engine) as Arc<dyn Denoiser>,
        pipeline_config(&config),
        Vec::new(),
    );
    let denoised = process_offline(&processor, &samples, params.samples_per_frame());

    let writer = std::fs::File::create(output)?;
    wav::write_samples(std::io::BufWriter::new(writer), &denoised, config.audio.sample_rate)?;

    if !quiet {
        eprintln!(
            "hushmic: wrote {} ({})",
            output.display(),
            processor.stats().summary()
        );
    }
    Ok(())
}
