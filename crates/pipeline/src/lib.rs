//! Per-session streaming orchestration pipeline
//!
//! This crate turns a continuous client audio stream into discrete
//! conversation turns and streams the synthesized reply back:
//! - Audio ingress queue bridging the client socket to the blocking
//!   transcription session
//! - Transcription bridge running that session on a dedicated worker
//!   thread and handing fragments into the async pipeline
//! - Turn debouncer coalescing bursts of end-of-turn fragments into
//!   one committed turn
//! - Synthesis relay streaming generated text into the synthesis
//!   session while fanning its audio back to the client in order

pub mod debounce;
pub mod ingress;
pub mod relay;
pub mod stt;
pub mod tts;

pub use debounce::{DebounceState, TurnDebouncer};
pub use ingress::{AudioIngress, FramePoll, FrameSource};
pub use relay::{RelayConfig, SynthesisRelay};
pub use stt::{BridgeEvent, TranscriberSession, TranscriptSink, TranscriptionBridge};
pub use tts::{
    SpeechSynthesizer, SynthesisConfig, SynthesisEvent, SynthesisInput, SynthesisOutput,
};

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Timeout")]
    Timeout,
}
