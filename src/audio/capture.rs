//! Microphone capture framed for the duplex transport

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};
use tokio::sync::mpsc;

use crate::audio::codec;
use crate::config::CAPTURE_SAMPLE_RATE;
use crate::{Error, Result};

/// Samples per outbound frame (mono, at the capture rate)
pub const FRAME_SAMPLES: usize = 4096;

/// MIME type attached to every outbound capture frame
pub const CAPTURE_MIME_TYPE: &str = "audio/pcm;rate=16000";

/// One capture frame, PCM16-encoded and base64-wrapped for transport
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    /// Base64-encoded PCM16 payload
    pub data: String,
    /// Payload MIME type
    pub mime_type: &'static str,
}

/// Captures microphone audio and emits fixed-size encoded frames
///
/// Frames are pushed into the registered sink in capture order; emission
/// never blocks the audio callback. `stop()` synchronously tears down the
/// stream so no further frames are produced and the device is released.
pub struct CapturePipeline {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
}

impl CapturePipeline {
    /// Open the default input device at the capture rate
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceAccess` if no device is available or none
    /// supports mono capture at 16 kHz
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::DeviceAccess("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::DeviceAccess(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(CAPTURE_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(CAPTURE_SAMPLE_RATE)
            })
            .ok_or_else(|| {
                Error::DeviceAccess("no suitable capture config found".to_string())
            })?;

        let config = supported_config
            .with_sample_rate(SampleRate(CAPTURE_SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = CAPTURE_SAMPLE_RATE,
            channels = config.channels,
            "capture pipeline initialized"
        );

        Ok(Self {
            device,
            config,
            stream: None,
        })
    }

    /// Start capturing, emitting encoded frames into `sink`
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceAccess` if the capture stream cannot be built
    /// or started
    pub fn start(&mut self, sink: mpsc::UnboundedSender<OutboundFrame>) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        // Pending samples accumulate inside the callback; a full frame is
        // encoded and emitted before the next one, preserving order.
        let mut pending: Vec<f32> = Vec::with_capacity(FRAME_SAMPLES * 2);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    pending.extend_from_slice(data);
                    while pending.len() >= FRAME_SAMPLES {
                        let frame: Vec<f32> = pending.drain(..FRAME_SAMPLES).collect();
                        let pcm = codec::f32_to_pcm16(&frame);
                        let msg = OutboundFrame {
                            data: codec::encode_base64(&pcm),
                            mime_type: CAPTURE_MIME_TYPE,
                        };
                        // Receiver gone means the session is tearing down
                        if sink.send(msg).is_err() {
                            pending.clear();
                            return;
                        }
                    }
                },
                |err| {
                    tracing::error!(error = %err, "capture stream error");
                },
                None,
            )
            .map_err(|e| Error::DeviceAccess(e.to_string()))?;

        stream.play().map_err(|e| Error::DeviceAccess(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!(frame_samples = FRAME_SAMPLES, "capture started");
        Ok(())
    }

    /// Stop capturing and release the device
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::debug!("capture stopped");
        }
    }

    /// Check if currently capturing
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }

    /// Get the capture sample rate
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        CAPTURE_SAMPLE_RATE
    }
}
