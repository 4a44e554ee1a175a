//! Configuration management for duet-studio

use crate::{Error, Result};

/// Model used for podcast script generation
pub const SCRIPT_MODEL: &str = "gemini-2.5-pro";

/// Model used for single-shot multi-speaker speech synthesis
pub const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Model used for live duplex voice conversation
pub const LIVE_MODEL: &str = "gemini-2.5-flash-native-audio-preview-09-2025";

/// Sample rate for captured microphone audio (Hz)
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;

/// Sample rate for audio received from the model (Hz)
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// duet-studio configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key (from `GEMINI_API_KEY`)
    pub api_key: String,

    /// Script generation model identifier
    pub script_model: String,

    /// Speech synthesis model identifier
    pub tts_model: String,

    /// Live conversation model identifier
    pub live_model: String,

    /// Prebuilt voice pair for the two podcast speakers, in declaration order
    pub voices: [String; 2],
}

impl Config {
    /// Load configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns error if `GEMINI_API_KEY` is not set
    pub fn load() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| Error::Config("GEMINI_API_KEY not set".to_string()))?;

        if api_key.is_empty() {
            return Err(Error::Config("GEMINI_API_KEY is empty".to_string()));
        }

        Ok(Self {
            api_key,
            script_model: std::env::var("DUET_SCRIPT_MODEL")
                .unwrap_or_else(|_| SCRIPT_MODEL.to_string()),
            tts_model: std::env::var("DUET_TTS_MODEL")
                .unwrap_or_else(|_| TTS_MODEL.to_string()),
            live_model: std::env::var("DUET_LIVE_MODEL")
                .unwrap_or_else(|_| LIVE_MODEL.to_string()),
            voices: [
                std::env::var("DUET_VOICE_A").unwrap_or_else(|_| "Kore".to_string()),
                std::env::var("DUET_VOICE_B").unwrap_or_else(|_| "Puck".to_string()),
            ],
        })
    }
}
