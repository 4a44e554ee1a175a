//! Gemini Live duplex transport
//!
//! Wraps the `BidiGenerateContent` WebSocket: audio frames go out as
//! realtime input, and everything inbound is mapped onto an explicit
//! [`TransportEvent`] enum consumed at a single dispatch point by the
//! session controller. Exactly one terminal event (`Error` or `Closed`)
//! is delivered per connection.

use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::audio::OutboundFrame;
use crate::{Error, Result};

type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Inbound transport lifecycle events
#[derive(Debug)]
pub enum TransportEvent {
    /// Handshake acknowledged; the session may open
    Opened,
    /// One server content message
    Message(ServerContent),
    /// Transport-level failure (terminal)
    Error(String),
    /// Remote close or end of stream (terminal)
    Closed,
}

/// Top-level inbound message envelope
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerMessage {
    pub setup_complete: Option<serde_json::Value>,
    pub server_content: Option<ServerContent>,
}

/// Server content: any combination of transcription fragments, a
/// turn-complete signal, and inline audio chunks
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerContent {
    pub input_transcription: Option<TranscriptionFragment>,
    pub output_transcription: Option<TranscriptionFragment>,
    pub turn_complete: bool,
    pub model_turn: Option<ModelTurn>,
}

/// One incremental transcription fragment
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TranscriptionFragment {
    pub text: String,
}

/// Model turn content carrying inline audio parts
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModelTurn {
    pub parts: Vec<TurnPart>,
}

/// One model turn part
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TurnPart {
    pub inline_data: Option<InlineAudio>,
}

/// Base64 PCM16 audio payload @ 24 kHz
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InlineAudio {
    pub mime_type: Option<String>,
    pub data: String,
}

impl ServerContent {
    /// Iterate the base64 audio payloads of this message, in order
    pub fn audio_chunks(&self) -> impl Iterator<Item = &str> {
        self.model_turn
            .iter()
            .flat_map(|turn| turn.parts.iter())
            .filter_map(|part| part.inline_data.as_ref())
            .map(|audio| audio.data.as_str())
    }
}

/// The live duplex connection
///
/// Owns the writer half; a spawned reader task forwards inbound frames as
/// [`TransportEvent`]s until a terminal event or [`close`](Self::close).
pub struct LiveTransport {
    writer: WsWriter,
    reader: JoinHandle<()>,
}

impl LiveTransport {
    /// Connect and send the session setup message
    ///
    /// Requests AUDIO response modality plus input and output transcription.
    /// Events arrive on `events` from a background reader task; `Opened` is
    /// emitted once the server acknowledges the setup.
    ///
    /// # Errors
    ///
    /// Returns `Error::WebSocket` if the connection or the setup send fails
    pub async fn connect(
        url: &str,
        model: &str,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Self> {
        let (ws, _) = connect_async(url).await?;
        let (mut writer, mut reader) = ws.split();

        let setup = json!({
            "setup": {
                "model": format!("models/{model}"),
                "generationConfig": {
                    "responseModalities": ["AUDIO"],
                },
                "inputAudioTranscription": {},
                "outputAudioTranscription": {},
            },
        });
        writer.send(Message::text(setup.to_string())).await?;

        tracing::debug!(model, "live transport connected, setup sent");

        let reader = tokio::spawn(async move {
            while let Some(frame) = reader.next().await {
                match frame {
                    Ok(Message::Text(text)) => dispatch(text.as_bytes(), &events),
                    Ok(Message::Binary(bytes)) => dispatch(&bytes, &events),
                    Ok(Message::Close(_)) => {
                        let _ = events.send(TransportEvent::Closed);
                        return;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let _ = events.send(TransportEvent::Error(e.to_string()));
                        return;
                    }
                }
            }
            // Stream ended without a close frame
            let _ = events.send(TransportEvent::Closed);
        });

        Ok(Self { writer, reader })
    }

    /// Send one captured audio frame as realtime input
    ///
    /// # Errors
    ///
    /// Returns `Error::WebSocket` if the send fails
    pub async fn send_audio(&mut self, frame: &OutboundFrame) -> Result<()> {
        let payload = json!({
            "realtimeInput": {
                "mediaChunks": [MediaChunk {
                    data: &frame.data,
                    mime_type: frame.mime_type,
                }],
            },
        });
        self.writer.send(Message::text(payload.to_string())).await?;
        Ok(())
    }

    /// Close the connection and stop the reader task
    ///
    /// No events are delivered after this returns.
    ///
    /// # Errors
    ///
    /// Returns `Error::WebSocket` if sending the close frame fails; the
    /// reader task is stopped regardless
    pub async fn close(&mut self) -> Result<()> {
        let result = self.writer.send(Message::Close(None)).await;
        self.reader.abort();
        result.map_err(Error::from)
    }
}

/// Outbound media chunk wire shape
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MediaChunk<'a> {
    data: &'a str,
    mime_type: &'a str,
}

/// Parse one inbound frame and forward it as a transport event
fn dispatch(bytes: &[u8], events: &mpsc::UnboundedSender<TransportEvent>) {
    match serde_json::from_slice::<ServerMessage>(bytes) {
        Ok(message) => {
            if message.setup_complete.is_some() {
                let _ = events.send(TransportEvent::Opened);
            }
            if let Some(content) = message.server_content {
                let _ = events.send(TransportEvent::Message(content));
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "unparseable live message, skipping");
        }
    }
}
