//! Audio boundary: PCM codec, stream parameters, device access, WAV files.

pub mod pcm;
pub mod stream;
pub mod wav;

#[cfg(feature = "cpal-audio")]
pub mod device;
#[cfg(feature = "cpal-audio")]
pub mod duplex;

pub use stream::{DuplexAudio, FrameCallback, MockDuplex, MockDuplexHandle, StreamParams};
