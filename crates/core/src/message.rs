//! Client/server wire messages
//!
//! The client channel is a bidirectional WebSocket. The first client
//! frame must be a `config` message carrying provider credentials;
//! every frame after that is binary audio. Server frames are JSON,
//! tagged by `type`.

use serde::{Deserialize, Serialize};

/// Provider credentials for one session, supplied by the client in its
/// first message. Gemini, AssemblyAI and Murf are mandatory; the tool
/// backends degrade to fallback strings when their keys are absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionKeys {
    #[serde(default)]
    pub gemini: Option<String>,
    #[serde(default)]
    pub assemblyai: Option<String>,
    #[serde(default)]
    pub murf: Option<String>,
    #[serde(default)]
    pub tavily: Option<String>,
    #[serde(default)]
    pub openweather: Option<String>,
}

impl SessionKeys {
    /// Names of required credentials that are absent or blank.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        for (name, value) in [
            ("gemini", &self.gemini),
            ("assemblyai", &self.assemblyai),
            ("murf", &self.murf),
        ] {
            if value.as_deref().map(str::trim).unwrap_or("").is_empty() {
                missing.push(name);
            }
        }
        missing
    }
}

/// Messages the client sends as JSON text frames.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Config {
        #[serde(default)]
        keys: SessionKeys,
    },
}

/// Messages the server sends to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A user turn was committed with this transcript.
    Transcription { text: String },
    /// Synthesized audio for the current turn starts now.
    AudioStreamStart,
    /// One synthesized audio chunk (base64 payload), in arrival order.
    AudioChunk { audio_data: String },
    /// No more audio will be sent for the current turn.
    AudioStreamEnd,
    /// The full generated response text for the current turn.
    LlmResponseText { text: String },
    /// A session-level error.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_wire_tags() {
        let msg = ServerMessage::Transcription {
            text: "hello".into(),
        };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"type":"transcription","text":"hello"}"#
        );

        let msg = ServerMessage::AudioStreamStart;
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"type":"audio_stream_start"}"#
        );

        let msg = ServerMessage::AudioChunk {
            audio_data: "UklGRg==".into(),
        };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"type":"audio_chunk","audio_data":"UklGRg=="}"#
        );

        let msg = ServerMessage::LlmResponseText { text: "hi".into() };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"type":"llm_response_text","text":"hi"}"#
        );
    }

    #[test]
    fn test_config_message_parses() {
        let raw = r#"{"type":"config","keys":{"gemini":"g","assemblyai":"a","murf":"m"}}"#;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        let ClientMessage::Config { keys } = msg;
        assert!(keys.missing_required().is_empty());
        assert!(keys.tavily.is_none());
    }

    #[test]
    fn test_missing_required_keys() {
        let raw = r#"{"type":"config","keys":{"gemini":"g","murf":""}}"#;
        let ClientMessage::Config { keys } = serde_json::from_str(raw).unwrap();
        assert_eq!(keys.missing_required(), vec!["assemblyai", "murf"]);

        let ClientMessage::Config { keys } =
            serde_json::from_str(r#"{"type":"config"}"#).unwrap();
        assert_eq!(keys.missing_required(), vec!["gemini", "assemblyai", "murf"]);
    }
}
