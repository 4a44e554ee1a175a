//! Duplex session controller
//!
//! Owns the lifecycle of one live conversation: microphone acquisition,
//! transport connection, wiring capture frames outbound and inbound
//! messages into the playback scheduler and transcript accumulator, and
//! deterministic teardown on stop, transport error, or remote close.

use tokio::sync::mpsc;

use crate::audio::{CapturePipeline, OutboundFrame, PlaybackScheduler};
use crate::gemini::GeminiClient;
use crate::live::transcript::{TranscriptAccumulator, TranscriptionEntry};
use crate::live::transport::{LiveTransport, ServerContent, TransportEvent};
use crate::{Error, Result};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Connecting,
    Open,
    Closing,
}

/// Events surfaced to the session's consumer
#[derive(Debug)]
pub enum SessionEvent {
    /// Handshake complete; audio is flowing
    Connected,
    /// One finalized transcript line
    Entry(TranscriptionEntry),
    /// Transport-level failure; the session has already been torn down
    Error(String),
    /// Normal close; the session has already been torn down
    Closed,
}

/// Controls one live duplex conversation
///
/// The capture pipeline, playback scheduler, and transcript accumulator are
/// reachable only through the session for its duration and are torn down
/// atomically with it. The microphone is acquired exactly once per
/// [`start`](Self::start) and released on every exit path.
pub struct LiveSession {
    status: SessionStatus,
    capture: Option<CapturePipeline>,
    scheduler: Option<PlaybackScheduler>,
    transport: Option<LiveTransport>,
    accumulator: TranscriptAccumulator,
    transport_rx: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    frame_tx: Option<mpsc::UnboundedSender<OutboundFrame>>,
    frame_rx: Option<mpsc::UnboundedReceiver<OutboundFrame>>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl LiveSession {
    /// Create an idle session that reports to `events`
    #[must_use]
    pub fn new(events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self {
            status: SessionStatus::Idle,
            capture: None,
            scheduler: None,
            transport: None,
            accumulator: TranscriptAccumulator::new(),
            transport_rx: None,
            frame_tx: None,
            frame_rx: None,
            events,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// Acquire the microphone and connect the duplex transport
    ///
    /// No-ops if a session is already active (the device is never acquired
    /// twice). The session opens once the server acknowledges the setup;
    /// drive it with [`run`](Self::run).
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceAccess` if the microphone cannot be acquired
    /// and `Error::Transport` if the connection fails; the session is back
    /// to idle in both cases
    pub async fn start(&mut self, client: &GeminiClient, model: &str) -> Result<()> {
        if self.status != SessionStatus::Idle {
            tracing::warn!(status = ?self.status, "session already active, ignoring start");
            return Ok(());
        }
        self.status = SessionStatus::Connecting;

        // Microphone first: exactly one device acquisition per start
        let capture = match CapturePipeline::new() {
            Ok(capture) => capture,
            Err(e) => {
                self.status = SessionStatus::Idle;
                return Err(e);
            }
        };

        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let transport = match LiveTransport::connect(&client.live_url(), model, transport_tx).await
        {
            Ok(transport) => transport,
            Err(e) => {
                // Dropping the capture pipeline releases the device
                self.status = SessionStatus::Idle;
                return Err(Error::Transport(e.to_string()));
            }
        };

        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        self.capture = Some(capture);
        self.transport = Some(transport);
        self.transport_rx = Some(transport_rx);
        self.frame_tx = Some(frame_tx);
        self.frame_rx = Some(frame_rx);

        tracing::info!(model, "session connecting");
        Ok(())
    }

    /// Drive the session until it ends
    ///
    /// Processes capture frames and transport events at a single dispatch
    /// point. Returns after a stop, transport error, or remote close; the
    /// terminal outcome is also surfaced as a [`SessionEvent`]. Dropping
    /// the returned future cancels the session; call
    /// [`stop`](Self::stop) afterwards to release resources.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if called before [`start`](Self::start)
    pub async fn run(&mut self) -> Result<()> {
        let mut transport_rx = self
            .transport_rx
            .take()
            .ok_or_else(|| Error::Transport("session not started".to_string()))?;
        let mut frame_rx = self
            .frame_rx
            .take()
            .ok_or_else(|| Error::Transport("session not started".to_string()))?;

        loop {
            tokio::select! {
                event = transport_rx.recv() => match event {
                    Some(TransportEvent::Opened) => {
                        if let Err(e) = self.on_open() {
                            tracing::error!(error = %e, "failed to open session, tearing down");
                            self.stop().await;
                            let _ = self.events.send(SessionEvent::Error(e.to_string()));
                            return Ok(());
                        }
                    }
                    Some(TransportEvent::Message(content)) => {
                        self.process_content(content);
                    }
                    Some(TransportEvent::Error(e)) => {
                        tracing::error!(error = %e, "transport error, tearing down");
                        self.stop().await;
                        let _ = self.events.send(SessionEvent::Error(e));
                        return Ok(());
                    }
                    Some(TransportEvent::Closed) | None => {
                        tracing::info!("remote closed the session");
                        self.stop().await;
                        let _ = self.events.send(SessionEvent::Closed);
                        return Ok(());
                    }
                },
                frame = frame_rx.recv() => {
                    let Some(frame) = frame else { continue };
                    let Some(transport) = self.transport.as_mut() else { continue };
                    if let Err(e) = transport.send_audio(&frame).await {
                        tracing::error!(error = %e, "outbound send failed, tearing down");
                        self.stop().await;
                        let _ = self.events.send(SessionEvent::Error(e.to_string()));
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handshake acknowledged: bring up both audio engines and open
    fn on_open(&mut self) -> Result<()> {
        if self.status != SessionStatus::Connecting {
            return Ok(());
        }

        let frame_tx = self
            .frame_tx
            .clone()
            .ok_or_else(|| Error::Transport("session not started".to_string()))?;

        let scheduler = PlaybackScheduler::new()?;
        if let Some(capture) = self.capture.as_mut() {
            capture.start(frame_tx)?;
        }

        self.scheduler = Some(scheduler);
        self.status = SessionStatus::Open;
        let _ = self.events.send(SessionEvent::Connected);
        tracing::info!("session open");
        Ok(())
    }

    /// Route one inbound server content message
    ///
    /// Transcription fragments append to the accumulator, a turn-complete
    /// signal flushes it into history entries, and audio chunks go to the
    /// playback scheduler. A chunk that fails to decode is dropped and the
    /// session continues.
    pub fn process_content(&mut self, content: ServerContent) {
        if let Some(fragment) = &content.input_transcription {
            self.accumulator.append_input(&fragment.text);
        }
        if let Some(fragment) = &content.output_transcription {
            self.accumulator.append_output(&fragment.text);
        }

        if content.turn_complete {
            for entry in self.accumulator.flush() {
                let _ = self.events.send(SessionEvent::Entry(entry));
            }
        }

        if let Some(scheduler) = &self.scheduler {
            for chunk in content.audio_chunks() {
                if let Err(e) = scheduler.enqueue(chunk) {
                    tracing::warn!(error = %e, "dropping undecodable audio chunk");
                }
            }
        }
    }

    /// Tear the session down and return to idle
    ///
    /// Valid from any state and idempotent. Closes the transport
    /// best-effort (close errors are logged, not propagated), halts
    /// playback, stops capture, and releases both audio engines and the
    /// microphone. No inbound or outbound message is processed after this
    /// returns.
    pub async fn stop(&mut self) {
        if self.status == SessionStatus::Idle {
            return;
        }
        self.status = SessionStatus::Closing;

        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                tracing::warn!(error = %e, "error closing transport");
            }
        }

        if let Some(scheduler) = self.scheduler.take() {
            scheduler.halt_all();
            // Dropping the scheduler closes the playback engine
        }

        if let Some(mut capture) = self.capture.take() {
            capture.stop();
        }

        self.frame_tx = None;
        self.frame_rx = None;
        self.transport_rx = None;
        self.accumulator = TranscriptAccumulator::new();

        self.status = SessionStatus::Idle;
        tracing::info!("session stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::audio::codec;

    /// Session with a hardware-free scheduler installed, as if the
    /// handshake had completed
    fn open_session(
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> LiveSession {
        let mut session = LiveSession::new(events);
        session.scheduler = Some(PlaybackScheduler::detached());
        session.status = SessionStatus::Open;
        session
    }

    fn chunk_of(samples: usize) -> String {
        codec::encode_base64(&codec::f32_to_pcm16(&vec![0.25; samples]))
    }

    fn content_with_audio(chunks: &[&str]) -> ServerContent {
        let parts: Vec<serde_json::Value> = chunks
            .iter()
            .map(|data| serde_json::json!({ "inlineData": { "data": data } }))
            .collect();
        serde_json::from_value(serde_json::json!({ "modelTurn": { "parts": parts } }))
            .unwrap()
    }

    #[test]
    fn test_inbound_audio_is_scheduled_while_open() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = open_session(tx);

        session.process_content(content_with_audio(&[&chunk_of(2400)]));

        let scheduler = session.scheduler.as_ref().unwrap();
        assert_eq!(scheduler.in_flight(), 1);
        assert!(scheduler.next_start_time() > 0.0);
    }

    #[test]
    fn test_undecodable_chunk_is_dropped_and_session_continues() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = open_session(tx);

        session.process_content(content_with_audio(&["!!not base64!!", &chunk_of(2400)]));

        // The good chunk plays, the bad one is gone
        assert_eq!(session.scheduler.as_ref().unwrap().in_flight(), 1);

        // Later messages are still routed
        let content: ServerContent = serde_json::from_value(serde_json::json!({
            "outputTranscription": { "text": "still here" },
            "turnComplete": true,
        }))
        .unwrap();
        session.process_content(content);

        match rx.try_recv().unwrap() {
            SessionEvent::Entry(entry) => assert_eq!(entry.text, "still here"),
            other => panic!("expected entry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_audio_after_stop_schedules_nothing() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = open_session(tx);

        session.process_content(content_with_audio(&[&chunk_of(2400)]));
        session.stop().await;
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.scheduler.is_none());

        // The playback engine is gone; a late chunk has nowhere to land
        session.process_content(content_with_audio(&[&chunk_of(2400)]));
        assert!(session.scheduler.is_none());
    }

    #[tokio::test]
    async fn test_open_failure_is_surfaced_exactly_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = LiveSession::new(tx);
        session.status = SessionStatus::Connecting;

        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel::<OutboundFrame>();
        session.transport_rx = Some(transport_rx);
        session.frame_rx = Some(frame_rx);
        // frame_tx deliberately not installed in the session, so the open
        // fails before any hardware is touched
        let _keep_frames_pending = frame_tx;

        transport_tx.send(TransportEvent::Opened).unwrap();
        assert!(session.run().await.is_ok());

        assert!(matches!(rx.try_recv().unwrap(), SessionEvent::Error(_)));
        assert!(rx.try_recv().is_err());
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[tokio::test]
    async fn test_transport_error_tears_down_and_reports() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = LiveSession::new(tx);
        session.status = SessionStatus::Connecting;

        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel::<OutboundFrame>();
        session.transport_rx = Some(transport_rx);
        session.frame_tx = Some(frame_tx);
        session.frame_rx = Some(frame_rx);

        transport_tx
            .send(TransportEvent::Error("connection reset".to_string()))
            .unwrap();
        assert!(session.run().await.is_ok());

        match rx.try_recv().unwrap() {
            SessionEvent::Error(message) => assert_eq!(message, "connection reset"),
            other => panic!("expected error event, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
        assert_eq!(session.status(), SessionStatus::Idle);
    }
}
