//! Error types for duet-studio

use thiserror::Error;

/// Result type alias for duet-studio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in duet-studio
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Microphone permission/device failure; terminal for the attempted session
    #[error("device access error: {0}")]
    DeviceAccess(String),

    /// Audio device or engine error
    #[error("audio error: {0}")]
    Audio(String),

    /// Network/session-level failure on the duplex transport
    #[error("transport error: {0}")]
    Transport(String),

    /// Codec-level decode failure on an unexpected buffer length
    #[error("malformed audio: {0}")]
    MalformedAudio(String),

    /// Generated script declared fewer than 2 speakers
    #[error("script has {0} speaker(s), multi-speaker synthesis requires exactly 2")]
    InsufficientSpeakers(usize),

    /// Speech synthesis response carried no audio payload
    #[error("no audio data returned by the synthesis API")]
    NoAudioReturned,

    /// Script generation error
    #[error("script generation error: {0}")]
    Script(String),

    /// Speech synthesis error
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket error
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
