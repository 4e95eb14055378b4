//! Audio device enumeration and selection via CPAL.

use crate::error::{HushmicError, Result};
use cpal::traits::{DeviceTrait, HostTrait};

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// This suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers
/// when probing audio backends. The messages are harmless but confusing to users.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2 (stderr).
/// Safe as long as no other thread is concurrently manipulating fd 2.
pub(crate) fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Suppress noisy JACK/ALSA messages that occur during audio backend probing.
///
/// # Safety
/// This modifies environment variables which is safe when called before
/// spawning threads.
pub fn suppress_audio_warnings() {
    // SAFETY: Called at startup before any threads are spawned
    unsafe {
        std::env::set_var("JACK_NO_START_SERVER", "1");
        std::env::set_var("JACK_NO_AUDIO_RESERVATION", "1");
        std::env::set_var("PIPEWIRE_DEBUG", "0");
        std::env::set_var("ALSA_DEBUG", "0");
        std::env::set_var("PW_LOG", "0");
    }
}

/// Preferred device names for GNOME/PipeWire environments.
const PREFERRED_DEVICES: &[&str] = &["pipewire", "pulse", "PulseAudio"];

/// Device name patterns to filter out (not useful for voice capture).
const FILTERED_PATTERNS: &[&str] = &[
    "surround",
    "front:",
    "rear:",
    "center:",
    "side:",
    "Digital Output",
    "HDMI",
    "S/PDIF",
];

fn should_filter_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    FILTERED_PATTERNS
        .iter()
        .any(|pattern| lower.contains(&pattern.to_lowercase()))
}

fn is_preferred_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    PREFERRED_DEVICES
        .iter()
        .any(|pref| lower.contains(&pref.to_lowercase()))
}

/// One enumerated audio device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    /// Position in the enumeration order (stable for one listing only).
    pub id: usize,
    pub name: String,
    pub max_input_channels: u16,
    pub max_output_channels: u16,
    pub default_sample_rate: u32,
    /// Marked when the device is a PipeWire/PulseAudio bridge, which
    /// respects the desktop's device selection.
    pub recommended: bool,
}

/// List available audio devices with capability information.
///
/// Filters out obviously unusable devices (surround channels, HDMI, etc.).
///
/// # Errors
/// Returns `HushmicError::AudioStream` if device enumeration fails.
pub fn enumerate_devices() -> Result<Vec<DeviceInfo>> {
    let devices = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        host.devices().map(|iter| iter.collect::<Vec<_>>())
    })
    .map_err(|e| HushmicError::AudioStream {
        message: format!("Failed to enumerate devices: {}", e),
    })?;

    let mut infos = Vec::new();
    for device in devices {
        let Ok(name) = device.name() else { continue };
        if should_filter_device(&name) {
            continue;
        }

        let (max_input_channels, input_rate) = with_suppressed_stderr(|| {
            device
                .default_input_config()
                .map(|c| (c.channels(), c.sample_rate().0))
                .unwrap_or((0, 0))
        });
        let (max_output_channels, output_rate) = with_suppressed_stderr(|| {
            device
                .default_output_config()
                .map(|c| (c.channels(), c.sample_rate().0))
                .unwrap_or((0, 0))
        });

        let default_sample_rate = if input_rate > 0 { input_rate } else { output_rate };
        let recommended = is_preferred_device(&name);

        infos.push(DeviceInfo {
            id: infos.len(),
            name,
            max_input_channels,
            max_output_channels,
            default_sample_rate,
            recommended,
        });
    }

    Ok(infos)
}

/// Find a capture device by name, or the best default when `None`.
///
/// The default prefers PipeWire/PulseAudio bridges over raw ALSA devices
/// so the desktop's device selection is respected.
pub fn find_input_device(name: Option<&str>) -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();

        if let Some(wanted) = name {
            let devices = host.input_devices().map_err(|e| HushmicError::AudioStream {
                message: format!("Failed to enumerate input devices: {}", e),
            })?;
            for device in devices {
                if let Ok(device_name) = device.name()
                    && device_name == wanted
                {
                    return Ok(device);
                }
            }
            return Err(HushmicError::AudioDeviceNotFound {
                device: wanted.to_string(),
            });
        }

        if let Ok(devices) = host.input_devices() {
            for device in devices {
                if let Ok(device_name) = device.name()
                    && is_preferred_device(&device_name)
                {
                    return Ok(device);
                }
            }
        }

        host.default_input_device()
            .ok_or_else(|| HushmicError::AudioDeviceNotFound {
                device: "default".to_string(),
            })
    })
}

/// Find a playback device by name, or the system default when `None`.
pub fn find_output_device(name: Option<&str>) -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();

        if let Some(wanted) = name {
            let devices = host
                .output_devices()
                .map_err(|e| HushmicError::AudioStream {
                    message: format!("Failed to enumerate output devices: {}", e),
                })?;
            for device in devices {
                if let Ok(device_name) = device.name()
                    && device_name == wanted
                {
                    return Ok(device);
                }
            }
            return Err(HushmicError::AudioDeviceNotFound {
                device: wanted.to_string(),
            });
        }

        host.default_output_device()
            .ok_or_else(|| HushmicError::AudioDeviceNotFound {
                device: "default".to_string(),
            })
    })
}
