//! Conversational agent for the voice bridge
//!
//! Owns the per-session conversation state and drives tool-augmented
//! response generation:
//! - Session registry mapping session ids to conversation history
//! - Generation orchestrator streaming replies and resolving tool
//!   calls mid-stream

pub mod orchestrator;
pub mod registry;

pub use orchestrator::Orchestrator;
pub use registry::{SessionRegistry, SessionState};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Generation error: {0}")]
    Generation(#[from] voicebridge_llm::LlmError),

    #[error("Session error: {0}")]
    Session(String),
}
