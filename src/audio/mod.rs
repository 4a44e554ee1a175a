//! Audio processing module
//!
//! Handles the PCM codec, microphone capture framing, and gapless
//! playback scheduling. The Gemini glue lives in `podcast` and `live`.

pub mod codec;

mod capture;
mod playback;

pub use capture::{CAPTURE_MIME_TYPE, CapturePipeline, FRAME_SAMPLES, OutboundFrame};
pub use playback::PlaybackScheduler;
