//! Gapless scheduling and playback of streamed audio chunks
//!
//! Network delivery is bursty and chunk boundaries are arbitrary. Each
//! decoded chunk is scheduled at `max(next_start, cursor)` and the clock
//! advances by exactly the chunk length, so chunks play back-to-back with
//! no gap and no overlap regardless of arrival timing.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream};

use crate::audio::codec;
use crate::config::PLAYBACK_SAMPLE_RATE;
use crate::{Error, Result};

/// One decoded chunk registered for playback
struct ScheduledChunk {
    /// Start offset on the shared clock, in frames
    start: u64,
    samples: Vec<f32>,
}

impl ScheduledChunk {
    fn end(&self) -> u64 {
        self.start + self.samples.len() as u64
    }
}

/// Shared playback state, mutated by `enqueue`/`halt_all` and rendered by
/// the output callback
struct Timeline {
    /// Frames rendered so far; the engine's current play-position
    cursor: u64,
    /// Earliest frame at which the next chunk may begin; non-decreasing
    /// between halts
    next_start: u64,
    in_flight: Vec<ScheduledChunk>,
}

impl Timeline {
    const fn new() -> Self {
        Self {
            cursor: 0,
            next_start: 0,
            in_flight: Vec::new(),
        }
    }

    /// Register a chunk and advance the clock by its duration
    fn schedule(&mut self, samples: Vec<f32>) -> u64 {
        let start = self.next_start.max(self.cursor);
        self.next_start = start + samples.len() as u64;
        self.in_flight.push(ScheduledChunk { start, samples });
        start
    }

    /// Mix scheduled chunks into an interleaved output block and advance
    /// the cursor; chunks fully behind the cursor are retired
    fn render_into(&mut self, out: &mut [f32], channels: usize) {
        let frames = out.len() / channels;

        for (i, frame) in out.chunks_mut(channels).enumerate() {
            let t = self.cursor + i as u64;
            let mut value = 0.0;
            for chunk in &self.in_flight {
                if t >= chunk.start && t < chunk.end() {
                    #[allow(clippy::cast_possible_truncation)]
                    let offset = (t - chunk.start) as usize;
                    value += chunk.samples[offset];
                }
            }
            for sample in frame.iter_mut() {
                *sample = value;
            }
        }

        self.cursor += frames as u64;
        let cursor = self.cursor;
        self.in_flight.retain(|c| c.end() > cursor);
    }

    fn halt(&mut self) {
        self.in_flight.clear();
        self.next_start = 0;
    }
}

/// Schedules received audio chunks for strictly ordered, gapless playback
///
/// The audio engine is a cpal output stream whose callback renders from the
/// shared timeline. A detached scheduler has no engine; its timeline is
/// advanced by calling [`render_into`](Self::render_into) directly.
pub struct PlaybackScheduler {
    timeline: Arc<Mutex<Timeline>>,
    /// Keeps the engine alive; dropping it closes the output stream
    #[allow(dead_code)]
    stream: Option<Stream>,
}

impl PlaybackScheduler {
    /// Open the default output device at the playback rate and start the
    /// engine
    ///
    /// # Errors
    ///
    /// Returns `Error::Audio` if no suitable output device is available
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
            })
            .or_else(|| {
                // Fallback: try stereo
                device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2
                        && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                        && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
                })
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = PLAYBACK_SAMPLE_RATE,
            channels = config.channels,
            "playback engine initialized"
        );

        let timeline = Arc::new(Mutex::new(Timeline::new()));
        let shared = Arc::clone(&timeline);
        let channels = config.channels as usize;

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if let Ok(mut timeline) = shared.lock() {
                        timeline.render_into(data, channels);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "playback stream error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        Ok(Self {
            timeline,
            stream: Some(stream),
        })
    }

    /// Create a scheduler without an audio engine
    ///
    /// The timeline only advances through explicit
    /// [`render_into`](Self::render_into) calls.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            timeline: Arc::new(Mutex::new(Timeline::new())),
            stream: None,
        }
    }

    /// Decode a base64 PCM16 chunk and schedule it for gapless playback
    ///
    /// Returns the scheduled start time in seconds on the playback clock.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedAudio` if the payload is not valid base64
    /// PCM16; the scheduler state is unchanged in that case
    pub fn enqueue(&self, data: &str) -> Result<f64> {
        let bytes = codec::decode_base64(data)?;
        let samples = codec::pcm16_to_mono_f32(&bytes)?;
        let duration = samples.len();

        let start = self
            .timeline
            .lock()
            .map_err(|_| Error::Audio("playback timeline poisoned".to_string()))?
            .schedule(samples);

        let start_secs = frames_to_secs(start);
        tracing::trace!(
            start = start_secs,
            frames = duration,
            "chunk scheduled"
        );
        Ok(start_secs)
    }

    /// Immediately stop all in-flight chunks and reset the playback clock
    ///
    /// Idempotent; safe to call when nothing is in flight.
    pub fn halt_all(&self) {
        if let Ok(mut timeline) = self.timeline.lock() {
            timeline.halt();
        }
    }

    /// Number of chunks currently registered for playback
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.timeline.lock().map(|t| t.in_flight.len()).unwrap_or(0)
    }

    /// Engine play-position in seconds
    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.timeline
            .lock()
            .map(|t| frames_to_secs(t.cursor))
            .unwrap_or(0.0)
    }

    /// Earliest time at which the next chunk may begin, in seconds
    #[must_use]
    pub fn next_start_time(&self) -> f64 {
        self.timeline
            .lock()
            .map(|t| frames_to_secs(t.next_start))
            .unwrap_or(0.0)
    }

    /// Render the next block of audio and advance the play-position
    ///
    /// This is the path the engine callback takes; detached schedulers call
    /// it directly.
    pub fn render_into(&self, out: &mut [f32], channels: usize) {
        if let Ok(mut timeline) = self.timeline.lock() {
            timeline.render_into(out, channels);
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn frames_to_secs(frames: u64) -> f64 {
    frames as f64 / f64::from(PLAYBACK_SAMPLE_RATE)
}
