//! Podcast pipeline integration tests
//!
//! Covers the two-speaker contract, prompt formatting, and the WAV
//! artifact without calling the Gemini API.

use duet_studio::podcast::{
    Language, PodcastScript, ScriptLine, WavArtifact, dialogue_prompt, enforce_two_speakers,
    synthesize_dialogue,
};
use duet_studio::{Error, GeminiClient};

fn script_with_speakers(speakers: &[&str]) -> PodcastScript {
    PodcastScript {
        title: "Test Episode".to_string(),
        speakers: speakers.iter().map(ToString::to_string).collect(),
        script: speakers
            .iter()
            .map(|s| ScriptLine {
                speaker: (*s).to_string(),
                line: format!("a line from {s}"),
            })
            .collect(),
    }
}

#[test]
fn test_extra_speakers_are_truncated_with_their_lines() {
    let mut script = script_with_speakers(&["Host", "Expert", "Guest"]);
    enforce_two_speakers(&mut script).unwrap();

    assert_eq!(script.speakers, vec!["Host", "Expert"]);
    assert_eq!(script.script.len(), 2);
    assert!(script.script.iter().all(|l| l.speaker != "Guest"));
}

#[test]
fn test_single_speaker_is_rejected() {
    let mut script = script_with_speakers(&["Host"]);
    let err = enforce_two_speakers(&mut script).unwrap_err();
    assert!(matches!(err, Error::InsufficientSpeakers(1)));
}

#[test]
fn test_two_speakers_pass_through_unchanged() {
    let mut script = script_with_speakers(&["Host", "Expert"]);
    let before = script.clone();
    enforce_two_speakers(&mut script).unwrap();
    assert_eq!(script, before);
}

#[test]
fn test_script_json_shape() {
    let raw = r#"{
        "title": "Rust in Plain Words",
        "speakers": ["Host", "Expert"],
        "script": [
            { "speaker": "Host", "line": "Welcome back!" },
            { "speaker": "Expert", "line": "Glad to be here." }
        ]
    }"#;

    let script: PodcastScript = serde_json::from_str(raw).unwrap();
    assert_eq!(script.title, "Rust in Plain Words");
    assert_eq!(script.speakers.len(), 2);
    assert_eq!(script.script[1].speaker, "Expert");
}

#[test]
fn test_dialogue_prompt_tags_every_line() {
    let script = script_with_speakers(&["Host", "Expert"]);
    let prompt = dialogue_prompt(&script);

    assert!(prompt.starts_with("TTS the following conversation:"));
    assert!(prompt.contains("Host: a line from Host"));
    assert!(prompt.contains("Expert: a line from Expert"));
}

#[tokio::test]
async fn test_synthesis_rejects_wrong_speaker_count() {
    let client = GeminiClient::new("test-key".to_string()).unwrap();
    let voices = ["Kore".to_string(), "Puck".to_string()];

    let script = script_with_speakers(&["Host"]);
    let err = synthesize_dialogue(&client, "tts-model", &script, &voices)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientSpeakers(1)));
}

#[test]
fn test_wav_artifact_shape() {
    let pcm = vec![0u8; 480];
    let artifact = WavArtifact::from_pcm(&pcm).unwrap();

    assert_eq!(artifact.content_type, "audio/wav");
    assert_eq!(&artifact.bytes[0..4], b"RIFF");
    assert_eq!(&artifact.bytes[8..12], b"WAVE");
    assert_eq!(artifact.bytes.len(), 44 + pcm.len());
}

#[test]
fn test_language_parsing() {
    assert_eq!("english".parse::<Language>().unwrap(), Language::English);
    assert_eq!("Hindi".parse::<Language>().unwrap(), Language::Hindi);
    assert!("french".parse::<Language>().is_err());

    assert_eq!(Language::English.to_string(), "english");
}

#[test]
fn test_empty_key_is_rejected() {
    assert!(GeminiClient::new(String::new()).is_err());
}
