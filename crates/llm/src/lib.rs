//! Streaming text generation client
//!
//! Wraps the generation provider's server-sent-event streaming API
//! behind the [`GenerationClient`] trait. The stream yields plain text
//! increments interleaved with tool-call requests; the orchestrator in
//! `voicebridge-agent` drives the tool round-trips.

pub mod gemini;
pub mod prompt;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::mpsc;

use voicebridge_core::Turn;

/// Generation errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider error: {0}")]
    Provider(String),
}

/// A structured request from the generation stream to invoke a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub name: String,
    pub args: Map<String, Value>,
}

/// One increment of a streaming generation.
///
/// The stream ends when the channel closes; an `Error` event means the
/// current generation terminated early, not that the session is dead.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    Text(String),
    ToolCall(ToolCallRequest),
    Error(String),
}

/// Streaming conversational text generation over an ordered history.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Start a generation over the given history. When `with_tools` is
    /// set, the closed tool schema is declared to the provider and the
    /// stream may yield tool-call events.
    async fn stream_generate(
        &self,
        history: &[Turn],
        with_tools: bool,
    ) -> Result<mpsc::Receiver<GenerationEvent>, LlmError>;
}
