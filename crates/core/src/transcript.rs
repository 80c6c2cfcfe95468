//! Transcript types for streaming transcription output

use serde::{Deserialize, Serialize};

/// One incremental transcription result from the transcription provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    /// Transcribed text
    pub text: String,

    /// Did the provider mark this as an end-of-turn result?
    pub is_final: bool,
}

impl TranscriptFragment {
    /// Create a partial (non-final) fragment
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    /// Create an end-of-turn fragment
    pub fn final_result(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }

    /// Only final fragments with non-empty text can complete a turn.
    pub fn is_turn_candidate(&self) -> bool {
        self.is_final && !self.text.trim().is_empty()
    }
}
