//! Gemini streaming client
//!
//! Uses the `streamGenerateContent` endpoint with `alt=sse`, decoding
//! each `data:` line into text and function-call increments.

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use voicebridge_core::{Turn, TurnRole};

use crate::{GenerationClient, GenerationEvent, LlmError, ToolCallRequest};

const EVENT_BUFFER: usize = 32;

/// Streaming client for a Gemini-style generation API.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiClient {
    pub fn new(
        http: reqwest::Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            api_base: api_base.into(),
        }
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn stream_generate(
        &self,
        history: &[Turn],
        with_tools: bool,
    ) -> Result<mpsc::Receiver<GenerationEvent>, LlmError> {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.api_base, self.model, self.api_key
        );

        let mut body = json!({ "contents": contents_from_history(history) });
        if with_tools {
            body["tools"] = json!([
                { "function_declarations": voicebridge_tools::function_declarations() }
            ]);
        }

        let response = self.http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(LlmError::Provider(format!(
                "generation request failed with status {}",
                response.status()
            )));
        }
        tracing::debug!(model = %self.model, with_tools, "generation stream open");

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        let _ = tx.send(GenerationEvent::Error(err.to_string())).await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));
                while let Some(pos) = buffer.find('\n') {
                    let line: String = buffer.drain(..=pos).collect();
                    for event in events_from_sse_line(line.trim_end()) {
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                }
            }

            for event in events_from_sse_line(buffer.trim_end()) {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
        });

        Ok(rx)
    }
}

/// Map conversation history to the provider's content format. The
/// provider names the assistant role "model".
fn contents_from_history(history: &[Turn]) -> Value {
    Value::Array(
        history
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    TurnRole::User => "user",
                    TurnRole::Assistant => "model",
                };
                json!({ "role": role, "parts": [{ "text": turn.text }] })
            })
            .collect(),
    )
}

fn events_from_sse_line(line: &str) -> Vec<GenerationEvent> {
    let Some(data) = line.strip_prefix("data:") else {
        return Vec::new();
    };
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Vec::new();
    }

    match serde_json::from_str::<Value>(data) {
        Ok(chunk) => events_from_chunk(&chunk),
        Err(err) => vec![GenerationEvent::Error(format!(
            "malformed stream chunk: {err}"
        ))],
    }
}

fn events_from_chunk(chunk: &Value) -> Vec<GenerationEvent> {
    let mut events = Vec::new();

    if let Some(parts) = chunk["candidates"][0]["content"]["parts"].as_array() {
        for part in parts {
            if let Some(call) = part.get("functionCall") {
                let name = call["name"].as_str().unwrap_or_default().to_string();
                let args = call["args"].as_object().cloned().unwrap_or_default();
                events.push(GenerationEvent::ToolCall(ToolCallRequest { name, args }));
            } else if let Some(text) = part["text"].as_str() {
                if !text.is_empty() {
                    events.push(GenerationEvent::Text(text.to_string()));
                }
            }
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contents_role_mapping() {
        let history = vec![Turn::user("hi"), Turn::assistant("hello")];
        let contents = contents_from_history(&history);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_text_chunk() {
        let chunk = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hello" }] } }]
        });
        assert_eq!(
            events_from_chunk(&chunk),
            vec![GenerationEvent::Text("Hello".into())]
        );
    }

    #[test]
    fn test_function_call_chunk() {
        let chunk = json!({
            "candidates": [{ "content": { "parts": [{
                "functionCall": { "name": "get_weather", "args": { "location": "Paris" } }
            }] } }]
        });
        let events = events_from_chunk(&chunk);
        let GenerationEvent::ToolCall(ref call) = events[0] else {
            panic!("expected tool call");
        };
        assert_eq!(call.name, "get_weather");
        assert_eq!(call.args["location"], "Paris");
    }

    #[test]
    fn test_sse_line_decoding() {
        assert!(events_from_sse_line("").is_empty());
        assert!(events_from_sse_line(": keepalive").is_empty());
        assert!(events_from_sse_line("data: [DONE]").is_empty());

        let events = events_from_sse_line(
            r#"data: {"candidates":[{"content":{"parts":[{"text":"hi"}]}}]}"#,
        );
        assert_eq!(events, vec![GenerationEvent::Text("hi".into())]);
    }

    #[test]
    fn test_malformed_chunk_becomes_error_event() {
        let events = events_from_sse_line("data: {not json");
        assert!(matches!(events[0], GenerationEvent::Error(_)));
    }
}
