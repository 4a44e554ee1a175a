//! Turn-bounded transcript accumulation
//!
//! Transcription fragments arrive incrementally and out of band from the
//! audio. Fragments append to per-speaker buffers until a turn-complete
//! signal flushes each non-empty buffer into one immutable history entry.

/// Who said a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Model,
}

/// One finalized transcript line
///
/// Entries are only ever appended to session history, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionEntry {
    /// Arrival-ordered identity, unique within the session
    pub id: u64,
    pub speaker: Speaker,
    pub text: String,
}

/// Merges partial transcription fragments into turn-bounded entries
#[derive(Debug, Default)]
pub struct TranscriptAccumulator {
    input: String,
    output: String,
    next_id: u64,
}

impl TranscriptAccumulator {
    /// Create an empty accumulator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment of what the user said
    pub fn append_input(&mut self, text: &str) {
        self.input.push_str(text);
    }

    /// Append a fragment of what the model said
    pub fn append_output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Finalize the current turn
    ///
    /// Each non-empty buffer (after trimming) becomes one entry, user before
    /// model, and both buffers reset. Returns no entries when both are empty.
    pub fn flush(&mut self) -> Vec<TranscriptionEntry> {
        let mut entries = Vec::with_capacity(2);

        let input = std::mem::take(&mut self.input);
        let input = input.trim();
        if !input.is_empty() {
            entries.push(self.entry(Speaker::User, input));
        }

        let output = std::mem::take(&mut self.output);
        let output = output.trim();
        if !output.is_empty() {
            entries.push(self.entry(Speaker::Model, output));
        }

        entries
    }

    fn entry(&mut self, speaker: Speaker, text: &str) -> TranscriptionEntry {
        let id = self.next_id;
        self.next_id += 1;
        TranscriptionEntry {
            id,
            speaker,
            text: text.to_string(),
        }
    }
}
