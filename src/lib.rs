//! Duet Studio - two-speaker podcast generation and live voice conversation
//!
//! This library provides the core functionality for the `duet` CLI:
//! - PCM codec (base64 transport encoding, PCM16 ⇄ f32, WAV containers)
//! - Microphone capture framed for a live duplex session
//! - Gapless scheduling of streamed synthesized speech
//! - A duplex session controller over the Gemini Live WebSocket API
//! - Podcast script generation and single-shot multi-speaker synthesis
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     duet CLI                         │
//! │        podcast  │  live  │  test-mic                │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                  duet-studio                         │
//! │  Capture  │  Playback  │  Session  │  Podcast       │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              Gemini API                              │
//! │  generateContent  │  TTS  │  Live (BidiGenerate)    │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod gemini;
pub mod live;
pub mod podcast;

pub use config::Config;
pub use error::{Error, Result};
pub use gemini::GeminiClient;
pub use live::{LiveSession, SessionEvent, SessionStatus, Speaker, TranscriptionEntry};
pub use podcast::{Language, PodcastScript, ScriptLine, WavArtifact};
