//! Live session integration tests
//!
//! Exercises the transcript accumulator, the inbound wire types, and the
//! session controller's dispatch and teardown without network or audio
//! hardware.

use tokio::sync::mpsc;

use duet_studio::live::transport::ServerMessage;
use duet_studio::live::{
    LiveSession, SessionEvent, SessionStatus, Speaker, TranscriptAccumulator,
};

#[test]
fn test_turn_flush_emits_user_then_model() {
    let mut acc = TranscriptAccumulator::new();
    acc.append_input("hi ");
    acc.append_input("there");
    acc.append_output("hello");

    let entries = acc.flush();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].speaker, Speaker::User);
    assert_eq!(entries[0].text, "hi there");
    assert_eq!(entries[1].speaker, Speaker::Model);
    assert_eq!(entries[1].text, "hello");

    // Buffers reset; an empty turn emits nothing
    assert!(acc.flush().is_empty());
}

#[test]
fn test_flush_trims_and_skips_blank_buffers() {
    let mut acc = TranscriptAccumulator::new();
    acc.append_input("  \n ");
    acc.append_output(" ok ");

    let entries = acc.flush();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].speaker, Speaker::Model);
    assert_eq!(entries[0].text, "ok");
}

#[test]
fn test_entry_ids_are_unique_and_increasing() {
    let mut acc = TranscriptAccumulator::new();
    acc.append_input("one");
    acc.append_output("two");
    let first = acc.flush();

    acc.append_output("three");
    let second = acc.flush();

    let ids: Vec<u64> = first.iter().chain(&second).map(|e| e.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn test_server_message_parsing() {
    let raw = r#"{
        "serverContent": {
            "inputTranscription": { "text": "hello " },
            "outputTranscription": { "text": "hi!" },
            "turnComplete": true,
            "modelTurn": {
                "parts": [
                    { "inlineData": { "mimeType": "audio/pcm;rate=24000", "data": "AAAA" } },
                    { "inlineData": { "data": "BBBB" } }
                ]
            }
        }
    }"#;

    let message: ServerMessage = serde_json::from_str(raw).unwrap();
    assert!(message.setup_complete.is_none());

    let content = message.server_content.unwrap();
    assert_eq!(content.input_transcription.as_ref().unwrap().text, "hello ");
    assert_eq!(content.output_transcription.as_ref().unwrap().text, "hi!");
    assert!(content.turn_complete);

    let chunks: Vec<&str> = content.audio_chunks().collect();
    assert_eq!(chunks, vec!["AAAA", "BBBB"]);
}

#[test]
fn test_setup_complete_parsing() {
    let message: ServerMessage = serde_json::from_str(r#"{ "setupComplete": {} }"#).unwrap();
    assert!(message.setup_complete.is_some());
    assert!(message.server_content.is_none());
}

#[test]
fn test_partial_server_message_defaults() {
    // Any combination of fields may be absent
    let message: ServerMessage =
        serde_json::from_str(r#"{ "serverContent": { "turnComplete": true } }"#).unwrap();
    let content = message.server_content.unwrap();
    assert!(content.turn_complete);
    assert!(content.input_transcription.is_none());
    assert_eq!(content.audio_chunks().count(), 0);
}

#[tokio::test]
async fn test_session_routes_transcription_to_history() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = LiveSession::new(tx);
    assert_eq!(session.status(), SessionStatus::Idle);

    let first: ServerMessage = serde_json::from_str(
        r#"{ "serverContent": { "inputTranscription": { "text": "what is " } } }"#,
    )
    .unwrap();
    let second: ServerMessage = serde_json::from_str(
        r#"{ "serverContent": {
            "inputTranscription": { "text": "rust?" },
            "outputTranscription": { "text": "a systems language" },
            "turnComplete": true
        } }"#,
    )
    .unwrap();

    session.process_content(first.server_content.unwrap());
    session.process_content(second.server_content.unwrap());

    let entry = match rx.try_recv().unwrap() {
        SessionEvent::Entry(entry) => entry,
        other => panic!("expected entry, got {other:?}"),
    };
    assert_eq!(entry.speaker, Speaker::User);
    assert_eq!(entry.text, "what is rust?");

    let entry = match rx.try_recv().unwrap() {
        SessionEvent::Entry(entry) => entry,
        other => panic!("expected entry, got {other:?}"),
    };
    assert_eq!(entry.speaker, Speaker::Model);
    assert_eq!(entry.text, "a systems language");

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_turn_complete_with_empty_buffers_emits_nothing() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = LiveSession::new(tx);

    let message: ServerMessage =
        serde_json::from_str(r#"{ "serverContent": { "turnComplete": true } }"#).unwrap();
    session.process_content(message.server_content.unwrap());

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_stop_is_idempotent_from_idle() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut session = LiveSession::new(tx);

    session.stop().await;
    session.stop().await;
    assert_eq!(session.status(), SessionStatus::Idle);
}

#[tokio::test]
async fn test_run_before_start_is_an_error() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut session = LiveSession::new(tx);

    assert!(session.run().await.is_err());
}
