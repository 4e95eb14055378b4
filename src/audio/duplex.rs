//! Full-duplex audio streaming using CPAL (Cross-Platform Audio Library).
//!
//! CPAL exposes capture and playback as separate streams, so the duplex
//! contract is assembled here: the input stream invokes the registered
//! frame callback, and the processed frame crosses to the output stream
//! through a bounded channel. The channel is the only cross-thread hop;
//! both sides are non-blocking: a full queue drops the oldest frame, an
//! empty queue plays silence.

use crate::audio::device::{find_input_device, find_output_device, with_suppressed_stderr};
use crate::audio::pcm;
use crate::audio::stream::{DuplexAudio, FrameCallback, StreamParams};
use crate::defaults;
use crate::error::{HushmicError, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use std::collections::VecDeque;

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: The stream is only accessed from the thread that owns the
/// CpalDuplex; stream methods are called synchronously and the handle never
/// crosses thread boundaries unsafely.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// CPAL-backed duplex stream.
///
/// Tries the i16 sample format first (zero-copy against the 16-bit PCM
/// boundary), then falls back to f32 with software conversion for hosts
/// that only expose float formats.
#[derive(Default)]
pub struct CpalDuplex {
    input: Option<SendableStream>,
    output: Option<SendableStream>,
}

impl CpalDuplex {
    pub fn new() -> Self {
        Self::default()
    }

    fn stream_config(params: &StreamParams) -> cpal::StreamConfig {
        cpal::StreamConfig {
            channels: params.channels,
            sample_rate: cpal::SampleRate(params.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(params.frame_len() as u32),
        }
    }

    fn build_streams(
        &self,
        params: &StreamParams,
        callback: FrameCallback,
    ) -> Result<(cpal::Stream, cpal::Stream)> {
        let input_device = find_input_device(params.input_device.as_deref())?;
        let output_device = find_output_device(params.output_device.as_deref())?;
        let config = Self::stream_config(params);

        let (tx, rx) = crossbeam_channel::bounded::<Vec<i16>>(defaults::OUTPUT_QUEUE_FRAMES);
        let drop_rx = rx.clone();

        let err_callback = |err| {
            eprintln!("hushmic: audio stream error: {}", err);
        };

        // Forward one processed frame to the playback queue, dropping the
        // oldest frame instead of blocking when playback lags.
        let forward = move |samples: Vec<i16>| {
            if let Err(crossbeam_channel::TrySendError::Full(frame)) = tx.try_send(samples) {
                let _ = drop_rx.try_recv();
                let _ = tx.try_send(frame);
            }
        };

        // Input: i16 preferred, f32 fallback.
        let input_stream = {
            let cb_i16 = FrameCallback::clone(&callback);
            let forward_i16 = forward.clone();
            let i16_attempt = with_suppressed_stderr(|| {
                input_device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let out = cb_i16(&pcm::i16_to_bytes(data));
                        forward_i16(pcm::bytes_to_i16(&out));
                    },
                    err_callback,
                    None,
                )
            });
            match i16_attempt {
                Ok(stream) => stream,
                Err(_) => {
                    let cb_f32 = FrameCallback::clone(&callback);
                    let forward_f32 = forward.clone();
                    with_suppressed_stderr(|| {
                        input_device.build_input_stream(
                            &config,
                            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                                let samples: Vec<i16> =
                                    data.iter().map(|&s| pcm::sample_to_i16(s)).collect();
                                let out = cb_f32(&pcm::i16_to_bytes(&samples));
                                forward_f32(pcm::bytes_to_i16(&out));
                            },
                            err_callback,
                            None,
                        )
                    })
                    .map_err(|e| HushmicError::AudioStream {
                        message: format!("Failed to build input stream: {}", e),
                    })?
                }
            }
        };

        // Output: drain queued frames through a carry buffer; zero-fill on
        // underrun so playback never glitches into garbage.
        let output_stream = {
            let rx_i16 = rx.clone();
            let mut carry: VecDeque<i16> = VecDeque::new();
            let i16_attempt = with_suppressed_stderr(|| {
                output_device.build_output_stream(
                    &config,
                    move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                        for slot in data.iter_mut() {
                            if carry.is_empty()
                                && let Ok(frame) = rx_i16.try_recv()
                            {
                                carry.extend(frame);
                            }
                            *slot = carry.pop_front().unwrap_or(0);
                        }
                    },
                    err_callback,
                    None,
                )
            });
            match i16_attempt {
                Ok(stream) => stream,
                Err(_) => {
                    let mut carry: VecDeque<i16> = VecDeque::new();
                    with_suppressed_stderr(|| {
                        output_device.build_output_stream(
                            &config,
                            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                                for slot in data.iter_mut() {
                                    if carry.is_empty()
                                        && let Ok(frame) = rx.try_recv()
                                    {
                                        carry.extend(frame);
                                    }
                                    *slot = carry
                                        .pop_front()
                                        .map(|s| s as f32 / 32768.0)
                                        .unwrap_or(0.0);
                                }
                            },
                            err_callback,
                            None,
                        )
                    })
                    .map_err(|e| HushmicError::AudioStream {
                        message: format!("Failed to build output stream: {}", e),
                    })?
                }
            }
        };

        Ok((input_stream, output_stream))
    }
}

impl DuplexAudio for CpalDuplex {
    fn open(&mut self, params: &StreamParams, callback: FrameCallback) -> Result<()> {
        let (input_stream, output_stream) = self.build_streams(params, callback)?;

        // Start playback before capture so the first processed frame has
        // somewhere to go.
        output_stream.play().map_err(|e| HushmicError::AudioStream {
            message: format!("Failed to start playback stream: {}", e),
        })?;
        input_stream.play().map_err(|e| HushmicError::AudioStream {
            message: format!("Failed to start capture stream: {}", e),
        })?;

        self.input = Some(SendableStream(input_stream));
        self.output = Some(SendableStream(output_stream));
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        // Pause then drop; dropping a cpal stream joins its callback, so no
        // further invocations occur after this returns.
        if let Some(stream) = self.input.take() {
            stream.0.pause().map_err(|e| HushmicError::AudioStream {
                message: format!("Failed to stop capture stream: {}", e),
            })?;
        }
        if let Some(stream) = self.output.take() {
            stream.0.pause().map_err(|e| HushmicError::AudioStream {
                message: format!("Failed to stop playback stream: {}", e),
            })?;
        }
        Ok(())
    }
}
