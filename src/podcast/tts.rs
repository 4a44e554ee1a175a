//! Single-shot multi-speaker speech synthesis
//!
//! Sends the whole dialogue in one request with a fixed mapping of the two
//! speakers onto two distinct prebuilt voices; the response carries the
//! complete episode as base64 PCM16 @ 24 kHz mono.

use serde_json::json;

use crate::gemini::GeminiClient;
use crate::podcast::script::PodcastScript;
use crate::{Error, Result};

/// Format the script as a speaker-tagged dialogue for the synthesis prompt
#[must_use]
pub fn dialogue_prompt(script: &PodcastScript) -> String {
    let dialogue = script
        .script
        .iter()
        .map(|line| format!("{}: {}", line.speaker, line.line))
        .collect::<Vec<_>>()
        .join("\n");

    format!("TTS the following conversation: \n{dialogue}")
}

/// Synthesize the full dialogue with one voice per speaker
///
/// Returns the episode audio as base64 PCM16 @ 24 kHz mono.
///
/// # Errors
///
/// Returns `Error::InsufficientSpeakers` unless the script has exactly 2
/// speakers, `Error::NoAudioReturned` if the response carries no audio
/// payload, and `Error::Synthesis` on API failure
pub async fn synthesize_dialogue(
    client: &GeminiClient,
    model: &str,
    script: &PodcastScript,
    voices: &[String; 2],
) -> Result<String> {
    if script.speakers.len() != 2 {
        return Err(Error::InsufficientSpeakers(script.speakers.len()));
    }

    let speaker_voice_configs: Vec<serde_json::Value> = script
        .speakers
        .iter()
        .zip(voices.iter())
        .map(|(speaker, voice)| {
            json!({
                "speaker": speaker,
                "voiceConfig": {
                    "prebuiltVoiceConfig": { "voiceName": voice },
                },
            })
        })
        .collect();

    let request = json!({
        "contents": [{ "parts": [{ "text": dialogue_prompt(script) }] }],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "multiSpeakerVoiceConfig": {
                    "speakerVoiceConfigs": speaker_voice_configs,
                },
            },
        },
    });

    tracing::debug!(
        speakers = ?script.speakers,
        lines = script.script.len(),
        "requesting multi-speaker synthesis"
    );

    let response = client
        .generate_content(model, &request)
        .await
        .map_err(|e| match e {
            Error::Script(msg) => Error::Synthesis(msg),
            other => other,
        })?;

    response
        .first_inline_data()
        .map(ToString::to_string)
        .ok_or(Error::NoAudioReturned)
}
