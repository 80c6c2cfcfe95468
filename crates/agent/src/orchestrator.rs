//! Generation orchestrator
//!
//! Drives one streaming reply per committed turn: forwards text
//! increments downstream as they arrive, intercepts tool-call requests
//! mid-stream, resolves them through the closed tool set and folds the
//! result into a secondary generation pass. A turn that has been
//! superseded keeps generating (provider streams cannot be safely
//! killed mid-flight) but stops forwarding.

use std::sync::Arc;

use tokio::sync::mpsc;

use voicebridge_core::{CommittedTurn, Turn};
use voicebridge_llm::{prompt, GenerationClient, GenerationEvent};
use voicebridge_tools::ToolExecutor;

use crate::registry::{SessionRegistry, SessionState};
use crate::AgentError;

pub struct Orchestrator {
    client: Arc<dyn GenerationClient>,
    tools: Arc<ToolExecutor>,
    registry: Arc<SessionRegistry>,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn GenerationClient>,
        tools: Arc<ToolExecutor>,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            client,
            tools,
            registry,
        }
    }

    /// Generate the reply for one committed turn, sending plain-text
    /// increments into `increments` as they arrive. Returns the full
    /// accumulated response text.
    ///
    /// On success the user/assistant exchange is appended to the
    /// session history; an empty response is never appended. Provider
    /// errors terminate only this turn.
    pub async fn respond(
        &self,
        session_id: &str,
        turn: &CommittedTurn,
        increments: mpsc::Sender<String>,
    ) -> Result<String, AgentError> {
        let session = self.registry.ensure(session_id);

        let mut contents = session.history_snapshot();
        if contents.is_empty() {
            contents = prompt::seed_history();
        }
        contents.push(Turn::user(&turn.text));

        tracing::info!(session = session_id, token = turn.token, "starting generation");

        let mut rx = self.client.stream_generate(&contents, true).await?;
        let mut full = String::new();
        let mut tool_done = false;

        while let Some(event) = rx.recv().await {
            match event {
                GenerationEvent::Text(text) => {
                    forward(&session, turn, &text, &mut full, &increments).await;
                }
                GenerationEvent::ToolCall(call) if !tool_done => {
                    tool_done = true;
                    tracing::info!(tool = %call.name, "generation requested tool call");

                    let result = self.tools.resolve(&call.name, &call.args).await;
                    self.follow_up(&session, turn, &contents, &result, &mut full, &increments)
                        .await;
                }
                GenerationEvent::ToolCall(call) => {
                    tracing::debug!(tool = %call.name, "ignoring additional tool call");
                }
                GenerationEvent::Error(err) => {
                    tracing::warn!(session = session_id, %err, "generation stream error");
                    break;
                }
            }
        }

        if !full.is_empty() {
            session.append_exchange(&turn.text, &full);
        }

        Ok(full)
    }

    /// Secondary pass folding a tool result back into the reply. Its
    /// text increments are forwarded as if they were primary output;
    /// tool calls inside it are not resolved again.
    async fn follow_up(
        &self,
        session: &SessionState,
        turn: &CommittedTurn,
        contents: &[Turn],
        tool_result: &str,
        full: &mut String,
        increments: &mpsc::Sender<String>,
    ) {
        let mut follow_contents = contents.to_vec();
        follow_contents.push(Turn::user(prompt::tool_followup_prompt(
            tool_result,
            &turn.text,
        )));

        let mut rx = match self.client.stream_generate(&follow_contents, false).await {
            Ok(rx) => rx,
            Err(err) => {
                tracing::warn!(%err, "follow-up generation failed");
                return;
            }
        };

        while let Some(event) = rx.recv().await {
            match event {
                GenerationEvent::Text(text) => {
                    forward(session, turn, &text, full, increments).await;
                }
                GenerationEvent::ToolCall(call) => {
                    tracing::debug!(tool = %call.name, "ignoring tool call in follow-up pass");
                }
                GenerationEvent::Error(err) => {
                    tracing::warn!(%err, "follow-up stream error");
                    break;
                }
            }
        }
    }
}

/// Accumulate an increment and forward it downstream unless the turn
/// has been superseded.
async fn forward(
    session: &SessionState,
    turn: &CommittedTurn,
    text: &str,
    full: &mut String,
    increments: &mpsc::Sender<String>,
) {
    full.push_str(text);
    if session.is_current(turn.token) {
        let _ = increments.send(text.to_string()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    use voicebridge_llm::{LlmError, ToolCallRequest};

    /// Generation client that replays scripted event sequences and
    /// records what it was called with.
    struct ScriptedClient {
        scripts: Mutex<VecDeque<Vec<GenerationEvent>>>,
        calls: Mutex<Vec<(Vec<Turn>, bool)>>,
    }

    impl ScriptedClient {
        fn new(scripts: Vec<Vec<GenerationEvent>>) -> Self {
            Self {
                scripts: Mutex::new(scripts.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl GenerationClient for ScriptedClient {
        async fn stream_generate(
            &self,
            history: &[Turn],
            with_tools: bool,
        ) -> Result<mpsc::Receiver<GenerationEvent>, LlmError> {
            self.calls.lock().push((history.to_vec(), with_tools));
            let events = self
                .scripts
                .lock()
                .pop_front()
                .ok_or_else(|| LlmError::Provider("no script left".into()))?;

            let (tx, rx) = mpsc::channel(16);
            tokio::spawn(async move {
                for event in events {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            });
            Ok(rx)
        }
    }

    fn orchestrator(client: Arc<ScriptedClient>) -> (Orchestrator, Arc<SessionRegistry>) {
        let registry = Arc::new(SessionRegistry::new());
        let tools = Arc::new(ToolExecutor::new(reqwest::Client::new(), None, None));
        (
            Orchestrator::new(client, tools, registry.clone()),
            registry,
        )
    }

    fn committed(registry: &SessionRegistry, session: &str, text: &str) -> CommittedTurn {
        CommittedTurn {
            text: text.to_string(),
            token: registry.ensure(session).turns().advance(),
        }
    }

    async fn drain(mut rx: mpsc::Receiver<String>) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(chunk) = rx.recv().await {
            out.push(chunk);
        }
        out
    }

    #[tokio::test]
    async fn test_plain_text_reply_appends_history() {
        let client = Arc::new(ScriptedClient::new(vec![vec![
            GenerationEvent::Text("Hello ".into()),
            GenerationEvent::Text("world".into()),
        ]]));
        let (orchestrator, registry) = orchestrator(client.clone());
        let turn = committed(&registry, "s1", "hi there");

        let (tx, rx) = mpsc::channel(16);
        let full = orchestrator.respond("s1", &turn, tx).await.unwrap();

        assert_eq!(full, "Hello world");
        assert_eq!(drain(rx).await, vec!["Hello ", "world"]);

        let history = registry.ensure("s1").history_snapshot();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text, "hi there");
        assert_eq!(history[1].text, "Hello world");

        // First turn of a session is generated over the seeded persona
        // exchange plus the user turn.
        let calls = client.calls.lock();
        assert_eq!(calls[0].0.len(), 3);
        assert!(calls[0].1);
    }

    #[tokio::test]
    async fn test_tool_call_triggers_single_follow_up() {
        let client = Arc::new(ScriptedClient::new(vec![
            vec![
                GenerationEvent::ToolCall(ToolCallRequest {
                    name: "get_weather".into(),
                    args: json!({"location": "Paris"}).as_object().cloned().unwrap(),
                }),
                // A second tool call in the primary stream is ignored.
                GenerationEvent::ToolCall(ToolCallRequest {
                    name: "search_web".into(),
                    args: json!({"query": "x"}).as_object().cloned().unwrap(),
                }),
            ],
            vec![GenerationEvent::Text("It is sunny in Paris".into())],
        ]));
        let (orchestrator, registry) = orchestrator(client.clone());
        let turn = committed(&registry, "s1", "weather in Paris?");

        let (tx, rx) = mpsc::channel(16);
        let full = orchestrator.respond("s1", &turn, tx).await.unwrap();

        assert_eq!(full, "It is sunny in Paris");
        assert_eq!(drain(rx).await, vec!["It is sunny in Paris"]);
        assert_eq!(client.call_count(), 2);

        let calls = client.calls.lock();
        // Follow-up pass runs without tools and carries the tool result
        // plus the original question.
        assert!(!calls[1].1);
        let followup = &calls[1].0.last().unwrap().text;
        assert!(followup.contains("Weather service unavailable"));
        assert!(followup.contains("weather in Paris?"));
    }

    #[tokio::test]
    async fn test_superseded_turn_stops_forwarding() {
        let client = Arc::new(ScriptedClient::new(vec![vec![GenerationEvent::Text(
            "too late".into(),
        )]]));
        let (orchestrator, registry) = orchestrator(client);
        let turn = committed(&registry, "s1", "old turn");
        // A newer turn commits before generation produces anything.
        registry.ensure("s1").turns().advance();

        let (tx, rx) = mpsc::channel(16);
        let full = orchestrator.respond("s1", &turn, tx).await.unwrap();

        assert_eq!(full, "too late");
        assert!(drain(rx).await.is_empty());
    }

    #[tokio::test]
    async fn test_stream_error_keeps_partial_text() {
        let client = Arc::new(ScriptedClient::new(vec![vec![
            GenerationEvent::Text("partial".into()),
            GenerationEvent::Error("connection reset".into()),
            GenerationEvent::Text("never seen".into()),
        ]]));
        let (orchestrator, registry) = orchestrator(client);
        let turn = committed(&registry, "s1", "hi");

        let (tx, _rx) = mpsc::channel(16);
        let full = orchestrator.respond("s1", &turn, tx).await.unwrap();

        assert_eq!(full, "partial");
        assert_eq!(registry.ensure("s1").history_len(), 2);
    }

    #[tokio::test]
    async fn test_empty_generation_leaves_history_untouched() {
        let client = Arc::new(ScriptedClient::new(vec![vec![]]));
        let (orchestrator, registry) = orchestrator(client);
        let turn = committed(&registry, "s1", "hi");

        let (tx, _rx) = mpsc::channel(16);
        let full = orchestrator.respond("s1", &turn, tx).await.unwrap();

        assert!(full.is_empty());
        assert_eq!(registry.ensure("s1").history_len(), 0);
    }
}
