//! Podcast generation pipeline
//!
//! Transcript → two-speaker script → single-shot multi-speaker synthesis →
//! playable WAV artifact. Thin glue over the Gemini API; errors here abort
//! the current request and never touch prior results.

mod script;
mod tts;

pub use script::{Language, PodcastScript, ScriptLine, enforce_two_speakers, generate_script};
pub use tts::{dialogue_prompt, synthesize_dialogue};

use crate::audio::codec;
use crate::config::PLAYBACK_SAMPLE_RATE;
use crate::gemini::GeminiClient;
use crate::{Config, Error, Result};

/// A playable WAV byte blob with its content type
#[derive(Debug, Clone)]
pub struct WavArtifact {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

impl WavArtifact {
    /// Wrap synthesized PCM16 @ 24 kHz mono in a WAV container
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedAudio` if the payload is not whole PCM16
    /// frames
    pub fn from_pcm(pcm: &[u8]) -> Result<Self> {
        Ok(Self {
            bytes: codec::wrap_wav(pcm, PLAYBACK_SAMPLE_RATE, 1, 16)?,
            content_type: "audio/wav",
        })
    }
}

/// Generate a podcast from a lecture transcript
///
/// # Errors
///
/// Returns `Error::Script` for an empty transcript or a failed generation
/// call, `Error::InsufficientSpeakers` / `Error::NoAudioReturned` on
/// collaborator contract violations, and codec errors if the returned audio
/// is malformed
pub async fn generate(
    client: &GeminiClient,
    config: &Config,
    transcript: &str,
    language: Language,
) -> Result<(PodcastScript, WavArtifact)> {
    if transcript.trim().is_empty() {
        return Err(Error::Script("empty transcript".to_string()));
    }

    tracing::info!(%language, "generating podcast script");
    let script = generate_script(client, &config.script_model, transcript, language).await?;
    tracing::info!(
        title = %script.title,
        lines = script.script.len(),
        "script generated"
    );

    tracing::info!("generating multi-speaker audio");
    let audio = synthesize_dialogue(client, &config.tts_model, &script, &config.voices).await?;

    let pcm = codec::decode_base64(&audio)?;
    let artifact = WavArtifact::from_pcm(&pcm)?;
    tracing::info!(bytes = artifact.bytes.len(), "podcast audio ready");

    Ok((script, artifact))
}
