//! WebSocket session handler
//!
//! One connection per session. The first client frame must be a
//! `config` message with provider credentials; every frame after that
//! is binary audio. All server messages flow through a single writer
//! task so ordering is preserved end to end.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use voicebridge_agent::Orchestrator;
use voicebridge_core::{ClientMessage, CommittedTurn, ServerMessage, SessionKeys, TurnSequence};
use voicebridge_llm::GeminiClient;
use voicebridge_pipeline::{
    ingress,
    stt::AssemblyAiSession,
    tts::MurfSynthesizer,
    BridgeEvent, RelayConfig, SynthesisConfig, SynthesisRelay, TranscriptionBridge, TurnDebouncer,
};
use voicebridge_tools::ToolExecutor;

use crate::state::AppState;

const OUTBOUND_BUFFER: usize = 64;
const INCREMENT_BUFFER: usize = 32;

/// Handle WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, session_id: String) {
    tracing::info!(session = %session_id, "client connected");
    let (sink, mut stream) = socket.split();

    let (out_tx, out_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_BUFFER);
    let writer = tokio::spawn(write_outbound(sink, out_rx));

    // Setup phase: no audio is processed until credentials check out.
    match configure(&mut stream).await {
        Ok(keys) => {
            run_session(&mut stream, out_tx.clone(), &state, &session_id, keys).await;
        }
        Err(message) => {
            tracing::warn!(session = %session_id, %message, "session setup failed");
            let _ = out_tx.send(ServerMessage::Error { message }).await;
        }
    }

    drop(out_tx);
    let _ = writer.await;
    tracing::info!(session = %session_id, "session closed");
}

/// Read and validate the mandatory configuration message.
async fn configure(stream: &mut SplitStream<WebSocket>) -> Result<SessionKeys, String> {
    match stream.next().await {
        Some(Ok(Message::Text(text))) => parse_config(&text),
        _ => Err("First message must be a configuration object.".to_string()),
    }
}

fn parse_config(raw: &str) -> Result<SessionKeys, String> {
    let message: ClientMessage = serde_json::from_str(raw)
        .map_err(|_| "First message must be a configuration object.".to_string())?;
    let ClientMessage::Config { keys } = message;

    if keys.missing_required().is_empty() {
        Ok(keys)
    } else {
        Err("Missing required API keys (Gemini, AssemblyAI, Murf).".to_string())
    }
}

async fn run_session(
    stream: &mut SplitStream<WebSocket>,
    out_tx: mpsc::Sender<ServerMessage>,
    state: &AppState,
    session_id: &str,
    keys: SessionKeys,
) {
    let settings = &state.settings;
    let session = state.registry.ensure(session_id);
    let turns = session.turns();

    // Ingress queue feeding the blocking transcription worker.
    let (audio_in, frames) = ingress::channel();
    let transcriber = AssemblyAiSession::new(
        keys.assemblyai.clone().unwrap_or_default(),
        settings.pipeline.sample_rate,
    );
    let mut bridge = TranscriptionBridge::spawn(Box::new(transcriber), frames);

    let (commit_tx, mut commit_rx) = mpsc::unbounded_channel::<CommittedTurn>();
    let mut debouncer = TurnDebouncer::new(
        Duration::from_millis(settings.pipeline.debounce_ms),
        turns.clone(),
        commit_tx,
    );

    let generator = Arc::new(GeminiClient::new(
        state.http.clone(),
        keys.gemini.clone().unwrap_or_default(),
        settings.generation.model.clone(),
        settings.generation.api_base.clone(),
    ));
    let tools = Arc::new(ToolExecutor::new(
        state.http.clone(),
        keys.tavily.clone(),
        keys.openweather.clone(),
    ));
    let orchestrator = Arc::new(Orchestrator::new(generator, tools, state.registry.clone()));

    let synthesizer = Arc::new(MurfSynthesizer::new(
        keys.murf.clone().unwrap_or_default(),
        SynthesisConfig {
            voice_id: settings.synthesis.voice_id.clone(),
            style: settings.synthesis.style.clone(),
            sample_rate: settings.synthesis.sample_rate,
            format: settings.synthesis.format.clone(),
        },
    ));
    let relay = Arc::new(SynthesisRelay::new(
        synthesizer,
        RelayConfig {
            idle_timeout: Duration::from_millis(settings.pipeline.synthesis_idle_timeout_ms),
        },
    ));

    // Transcript fragments drive the debouncer.
    let fragment_session = session_id.to_string();
    let fragment_task = tokio::spawn(async move {
        while let Some(event) = bridge.next_event().await {
            match event {
                BridgeEvent::Fragment(fragment) => debouncer.on_fragment(&fragment),
                BridgeEvent::Error(err) => {
                    tracing::error!(session = %fragment_session, %err, "transcription error");
                }
                BridgeEvent::Ended => break,
            }
        }
    });

    // Committed turns start one generation/synthesis leg each.
    let commit_out = out_tx.clone();
    let commit_session = session_id.to_string();
    let commit_turns = turns.clone();
    let commit_task = tokio::spawn(async move {
        while let Some(turn) = commit_rx.recv().await {
            let _ = commit_out
                .send(ServerMessage::Transcription {
                    text: turn.text.clone(),
                })
                .await;
            tokio::spawn(run_turn(
                orchestrator.clone(),
                relay.clone(),
                commit_turns.clone(),
                commit_session.clone(),
                turn,
                commit_out.clone(),
            ));
        }
    });

    // Client receive loop: binary frames feed the ingress queue until
    // the client disconnects.
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Binary(frame)) => audio_in.push(frame),
            Ok(Message::Close(_)) => break,
            Ok(Message::Text(_)) => {
                tracing::debug!(session = %session_id, "ignoring unexpected text frame");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::info!(session = %session_id, %err, "client receive failed");
                break;
            }
        }
    }

    // Teardown: the sentinel stops the transcription worker, which
    // ends the fragment task, which drops the debouncer and with it
    // the commit channel.
    audio_in.close();
    let _ = fragment_task.await;
    let _ = commit_task.await;
}

/// Generation and synthesis for one committed turn. The relay always
/// brackets the turn with stream start/end and the response text, even
/// when generation fails, so the client pipeline can reset.
async fn run_turn(
    orchestrator: Arc<Orchestrator>,
    relay: Arc<SynthesisRelay>,
    turns: TurnSequence,
    session_id: String,
    turn: CommittedTurn,
    out: mpsc::Sender<ServerMessage>,
) {
    let (text_tx, text_rx) = mpsc::channel(INCREMENT_BUFFER);

    let generation = {
        let orchestrator = orchestrator.clone();
        let session_id = session_id.clone();
        let turn = turn.clone();
        tokio::spawn(async move { orchestrator.respond(&session_id, &turn, text_tx).await })
    };

    relay.run(&turns, turn.token, text_rx, out).await;

    match generation.await {
        Ok(Ok(full)) => {
            tracing::debug!(session = %session_id, token = turn.token, chars = full.len(), "turn complete");
        }
        Ok(Err(err)) => {
            tracing::warn!(session = %session_id, token = turn.token, %err, "generation failed");
        }
        Err(err) => {
            tracing::error!(session = %session_id, %err, "generation task panicked");
        }
    }
}

/// Single writer draining all server messages to the socket, so
/// cross-task sends cannot interleave mid-message.
async fn write_outbound(
    mut sink: SplitSink<WebSocket, Message>,
    mut out_rx: mpsc::Receiver<ServerMessage>,
) {
    while let Some(message) = out_rx.recv().await {
        let payload = match serde_json::to_string(&message) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(%err, "failed to encode server message");
                continue;
            }
        };
        if sink.send(Message::Text(payload)).await.is_err() {
            break;
        }
    }
}
