//! Speech synthesis session interface
//!
//! One synthesis session is opened per in-flight generation. The
//! session splits into an input half (text increments, each tagged end
//! or not) and an output half (audio events drained by a dedicated
//! receiver). The relay in [`crate::relay`] wires the two to the
//! client channel.

pub mod murf;

pub use murf::MurfSynthesizer;

use async_trait::async_trait;

use crate::PipelineError;

/// Voice configuration for a synthesis session.
#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    pub voice_id: String,
    pub style: String,
    pub sample_rate: u32,
    pub format: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            voice_id: "en-US-amara".to_string(),
            style: "Conversational".to_string(),
            sample_rate: 44_100,
            format: "WAV".to_string(),
        }
    }
}

/// One audio event from the synthesis provider. A single event may
/// carry both an audio payload and the final flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthesisEvent {
    /// Base64 audio payload, if this event carries audio.
    pub audio: Option<String>,
    /// Provider marked the stream complete.
    pub is_final: bool,
}

/// Text input half of a synthesis session.
#[async_trait]
pub trait SynthesisInput: Send {
    /// Forward one text increment; `end` marks end of input for the
    /// turn.
    async fn send_text(&mut self, text: &str, end: bool) -> Result<(), PipelineError>;
}

/// Audio output half of a synthesis session.
#[async_trait]
pub trait SynthesisOutput: Send {
    /// Next audio event; `Ok(None)` once the provider closed the
    /// stream.
    async fn next_event(&mut self) -> Result<Option<SynthesisEvent>, PipelineError>;
}

/// Factory opening one synthesis session per turn.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn open(
        &self,
    ) -> Result<(Box<dyn SynthesisInput>, Box<dyn SynthesisOutput>), PipelineError>;
}
