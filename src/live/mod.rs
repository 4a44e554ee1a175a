//! Live duplex voice conversation
//!
//! A session owns the microphone capture pipeline, the playback scheduler,
//! the transcript accumulator, and the WebSocket transport for their whole
//! lifetime; all four are torn down atomically when the session ends.

pub mod transport;

mod session;
mod transcript;

pub use session::{LiveSession, SessionEvent, SessionStatus};
pub use transcript::{Speaker, TranscriptAccumulator, TranscriptionEntry};
pub use transport::{LiveTransport, ServerContent, TransportEvent};
