//! Podcast script generation
//!
//! Calls generateContent with a JSON response schema and enforces the
//! exactly-two-speaker contract required by multi-speaker synthesis.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::gemini::GeminiClient;
use crate::{Error, Result};

/// Target language for the generated script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Hindi,
}

impl Language {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Hindi => "hindi",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "english" => Ok(Self::English),
            "hindi" => Ok(Self::Hindi),
            other => Err(Error::Config(format!(
                "unsupported language: {other} (expected english or hindi)"
            ))),
        }
    }
}

/// One line of dialogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLine {
    /// Must be one of the script's declared speakers
    pub speaker: String,
    pub line: String,
}

/// A generated podcast script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodcastScript {
    pub title: String,
    /// Exactly 2 unique speaker names after enforcement
    pub speakers: Vec<String>,
    pub script: Vec<ScriptLine>,
}

/// Enforce exactly 2 speakers for synthesis compatibility
///
/// A script with more than 2 speakers is truncated to the first 2 and every
/// dialogue line from a removed speaker is dropped.
///
/// # Errors
///
/// Returns `Error::InsufficientSpeakers` if fewer than 2 are declared
pub fn enforce_two_speakers(script: &mut PodcastScript) -> Result<()> {
    if script.speakers.len() < 2 {
        return Err(Error::InsufficientSpeakers(script.speakers.len()));
    }

    if script.speakers.len() > 2 {
        tracing::warn!(
            declared = script.speakers.len(),
            "script declared extra speakers, truncating to 2"
        );
        script.speakers.truncate(2);
        let allowed = script.speakers.clone();
        script
            .script
            .retain(|line| allowed.contains(&line.speaker));
    }

    Ok(())
}

/// JSON response schema constraining the generated script shape
fn response_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": {
                "type": "STRING",
                "description": "A catchy title for the podcast episode.",
            },
            "speakers": {
                "type": "ARRAY",
                "description": "A list of exactly 2 unique speaker names (e.g., 'Host', 'Expert A').",
                "items": { "type": "STRING" },
            },
            "script": {
                "type": "ARRAY",
                "description": "The full podcast script as an array of objects.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "speaker": {
                            "type": "STRING",
                            "description": "The name of the speaker for this line. Must be one of the names from the 'speakers' list.",
                        },
                        "line": {
                            "type": "STRING",
                            "description": "The dialogue for the speaker.",
                        },
                    },
                    "required": ["speaker", "line"],
                },
            },
        },
        "required": ["title", "speakers", "script"],
    })
}

/// Generate a two-speaker podcast script from a lecture transcript
///
/// # Errors
///
/// Returns `Error::Script` if the call fails or returns no parseable
/// script, and `Error::InsufficientSpeakers` if the result declares fewer
/// than 2 speakers
pub async fn generate_script(
    client: &GeminiClient,
    model: &str,
    transcript: &str,
    language: Language,
) -> Result<PodcastScript> {
    let prompt = format!(
        "Based on the following lecture transcript, create a detailed podcast script \
         in the {language} language for a discussion between exactly 2 people (e.g., a \
         Host and an Expert). The podcast should break down the key concepts from the \
         transcript, offer different perspectives, and make the content engaging for a \
         general audience. Ensure the generated script strictly follows the provided \
         JSON schema. Transcript: \"{transcript}\""
    );

    let request = json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema(),
        },
    });

    let response = client.generate_content(model, &request).await?;
    let text = response
        .first_text()
        .ok_or_else(|| Error::Script("no script text in response".to_string()))?;

    let mut script: PodcastScript = serde_json::from_str(text)
        .map_err(|e| Error::Script(format!("unparseable script JSON: {e}")))?;

    enforce_two_speakers(&mut script)?;
    Ok(script)
}
