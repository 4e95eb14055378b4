//! Virtual microphone relay.
//!
//! Exposes the denoised stream as an input device other applications can
//! capture from. The service wraps a platform backend behind a lifecycle
//! (`create` → `start` → `stop` → `destroy`); the backend is chosen once
//! at startup by `platform_backend`, and platforms without one report
//! `VirtualMicUnsupported`, which callers treat as "no sink available",
//! never as fatal.
//!
//! The Linux backend writes raw PCM into a named pipe, which PipeWire and
//! PulseAudio can surface as a capture device:
//!
//! ```text
//! pactl load-module module-pipe-source source_name=hushmic \
//!       file=/run/user/$UID/hushmic-mic.pcm format=s16le rate=16000 channels=1
//! ```

use crate::error::{HushmicError, Result};
use crate::sink::DeviceSink;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Lifecycle state of the virtual microphone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtualMicStatus {
    Uninitialized,
    Created,
    Streaming,
    Stopped,
    Destroyed,
}

/// Platform backend behind the virtual microphone service.
pub trait VirtualMicBackend: Send {
    fn create(&mut self) -> Result<()>;
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn destroy(&mut self) -> Result<()>;

    /// Push one frame of 16-bit PCM to the virtual device. Best-effort;
    /// must not block.
    fn stream_audio_frame(&mut self, frame: &[u8]) -> Result<()>;
}

/// Platform-agnostic virtual microphone with explicit lifecycle.
pub struct VirtualMicService {
    backend: Box<dyn VirtualMicBackend>,
    status: VirtualMicStatus,
}

impl VirtualMicService {
    pub fn new(backend: Box<dyn VirtualMicBackend>) -> Self {
        Self {
            backend,
            status: VirtualMicStatus::Uninitialized,
        }
    }

    /// Construct the service with the platform's backend, if any.
    ///
    /// # Errors
    /// `VirtualMicUnsupported` on platforms without a backend.
    pub fn platform_default(path_override: Option<PathBuf>) -> Result<Self> {
        platform_backend(path_override).map(Self::new)
    }

    pub fn create(&mut self) -> Result<()> {
        self.backend.create()?;
        self.status = VirtualMicStatus::Created;
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.backend.start()?;
        self.status = VirtualMicStatus::Streaming;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        self.backend.stop()?;
        self.status = VirtualMicStatus::Stopped;
        Ok(())
    }

    pub fn destroy(&mut self) -> Result<()> {
        self.backend.destroy()?;
        self.status = VirtualMicStatus::Destroyed;
        Ok(())
    }

    pub fn status(&self) -> VirtualMicStatus {
        self.status
    }

    pub fn stream_audio_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.backend.stream_audio_frame(frame)
    }
}

/// Sink adapter routing processed frames into a shared service.
///
/// Uses `try_lock` so the audio callback never waits on the control
/// thread; a frame that arrives while the lock is held is dropped.
pub struct VirtualMicSink {
    service: Arc<Mutex<VirtualMicService>>,
}

impl VirtualMicSink {
    pub fn new(service: Arc<Mutex<VirtualMicService>>) -> Self {
        Self { service }
    }
}

impl DeviceSink for VirtualMicSink {
    fn name(&self) -> &'static str {
        "virtual-mic"
    }

    fn deliver(&self, frame: &[u8]) -> Result<()> {
        match self.service.try_lock() {
            Ok(mut service) => service.stream_audio_frame(frame),
            Err(std::sync::TryLockError::WouldBlock) => Ok(()),
            Err(std::sync::TryLockError::Poisoned(e)) => Err(HushmicError::VirtualMic {
                message: format!("service lock poisoned: {}", e),
            }),
        }
    }
}

/// Select the platform backend once at startup.
pub fn platform_backend(path_override: Option<PathBuf>) -> Result<Box<dyn VirtualMicBackend>> {
    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(linux::FifoVirtualMic::new(
            path_override.unwrap_or_else(linux::default_fifo_path),
        )))
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = path_override;
        Err(HushmicError::VirtualMicUnsupported)
    }
}

#[cfg(target_os = "linux")]
pub mod linux {
    use super::VirtualMicBackend;
    use crate::error::{HushmicError, Result};
    use std::fs::{File, OpenOptions};
    use std::io::{ErrorKind, Write};
    use std::os::unix::ffi::OsStrExt;
    use std::os::unix::fs::OpenOptionsExt;
    use std::path::PathBuf;

    /// Default pipe location: the user runtime dir, falling back to /tmp.
    pub fn default_fifo_path() -> PathBuf {
        dirs::runtime_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("hushmic-mic.pcm")
    }

    /// Named-pipe virtual microphone for PipeWire/PulseAudio.
    ///
    /// `create` makes the FIFO, `start` arms writing. The write end opens
    /// lazily: opening a FIFO for writing fails with ENXIO until a reader
    /// (the `module-pipe-source` consumer) attaches, so frames are simply
    /// dropped until then. All writes are non-blocking.
    pub struct FifoVirtualMic {
        path: PathBuf,
        writer: Option<File>,
        armed: bool,
    }

    impl FifoVirtualMic {
        pub fn new(path: PathBuf) -> Self {
            Self {
                path,
                writer: None,
                armed: false,
            }
        }

        pub fn path(&self) -> &PathBuf {
            &self.path
        }

        fn try_open_writer(&mut self) -> Result<bool> {
            match OpenOptions::new()
                .write(true)
                .custom_flags(libc::O_NONBLOCK)
                .open(&self.path)
            {
                Ok(file) => {
                    self.writer = Some(file);
                    Ok(true)
                }
                // ENXIO: no reader attached yet
                Err(e) if e.raw_os_error() == Some(libc::ENXIO) => Ok(false),
                Err(e) => Err(HushmicError::VirtualMic {
                    message: format!("failed to open {}: {}", self.path.display(), e),
                }),
            }
        }
    }

    impl VirtualMicBackend for FifoVirtualMic {
        fn create(&mut self) -> Result<()> {
            let c_path =
                std::ffi::CString::new(self.path.as_os_str().as_bytes()).map_err(|_| {
                    HushmicError::VirtualMic {
                        message: format!("invalid fifo path: {}", self.path.display()),
                    }
                })?;
            // SAFETY: c_path is a valid NUL-terminated path for this call.
            let ret = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
            if ret != 0 {
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() != Some(libc::EEXIST) {
                    return Err(HushmicError::VirtualMic {
                        message: format!("mkfifo {} failed: {}", self.path.display(), err),
                    });
                }
            }
            Ok(())
        }

        fn start(&mut self) -> Result<()> {
            self.armed = true;
            // A missing reader is fine; the writer opens lazily later.
            self.try_open_writer()?;
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            self.armed = false;
            self.writer = None;
            Ok(())
        }

        fn destroy(&mut self) -> Result<()> {
            self.writer = None;
            self.armed = false;
            match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(HushmicError::VirtualMic {
                    message: format!("failed to remove {}: {}", self.path.display(), e),
                }),
            }
        }

        fn stream_audio_frame(&mut self, frame: &[u8]) -> Result<()> {
            if !self.armed {
                return Ok(());
            }
            if self.writer.is_none() && !self.try_open_writer()? {
                // No reader yet; drop the frame.
                return Ok(());
            }
            if let Some(writer) = self.writer.as_mut() {
                match writer.write(frame) {
                    Ok(_) => {}
                    // Pipe full: drop the frame rather than block.
                    Err(e) if e.kind() == ErrorKind::WouldBlock => {}
                    // Reader went away; re-open lazily on the next frame.
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                        self.writer = None;
                    }
                    Err(e) => {
                        self.writer = None;
                        return Err(HushmicError::VirtualMic {
                            message: format!("write to {} failed: {}", self.path.display(), e),
                        });
                    }
                }
            }
            Ok(())
        }
    }
}
