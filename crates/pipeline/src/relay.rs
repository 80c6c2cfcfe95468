//! Synthesis relay
//!
//! Streams generated text increments into a synthesis session while a
//! dedicated receiver fans the session's audio chunks back to the
//! client in arrival order. The relay brackets every turn with
//! `audio_stream_start` / `audio_stream_end` and closes with the full
//! response text, including on partial failure, so the client never
//! waits on a turn it started.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use voicebridge_core::{ServerMessage, TurnSequence};

use crate::tts::{SpeechSynthesizer, SynthesisInput, SynthesisOutput};

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Idle wait on the audio stream before it is treated as ended.
    pub idle_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(10),
        }
    }
}

pub struct SynthesisRelay {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    config: RelayConfig,
}

impl SynthesisRelay {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, config: RelayConfig) -> Self {
        Self {
            synthesizer,
            config,
        }
    }

    /// Run the synthesis leg of one turn until the text stream closes
    /// and the audio receiver terminates. Returns the accumulated
    /// response text (which is also delivered to the client).
    ///
    /// Audio for a superseded turn is suppressed at the forwarding
    /// point; chunks already handed to the socket cannot be recalled,
    /// so suppression is best effort.
    pub async fn run(
        &self,
        turns: &TurnSequence,
        token: u64,
        mut text_rx: mpsc::Receiver<String>,
        out: mpsc::Sender<ServerMessage>,
    ) -> String {
        let _ = out.send(ServerMessage::AudioStreamStart).await;

        let mut input: Option<Box<dyn SynthesisInput>> = None;
        let mut receiver: Option<JoinHandle<()>> = None;
        let mut spoken = String::new();

        while let Some(chunk) = text_rx.recv().await {
            spoken.push_str(&chunk);

            if input.is_none() {
                match self.synthesizer.open().await {
                    Ok((session_input, session_output)) => {
                        receiver = Some(tokio::spawn(drain_audio(
                            session_output,
                            out.clone(),
                            turns.clone(),
                            token,
                            self.config.idle_timeout,
                        )));
                        input = Some(session_input);
                    }
                    Err(err) => {
                        tracing::warn!(%err, "failed to open synthesis session");
                        break;
                    }
                }
            }

            if let Some(session_input) = input.as_mut() {
                if let Err(err) = session_input.send_text(&chunk, false).await {
                    tracing::warn!(%err, "synthesis text send failed");
                    break;
                }
            }
        }

        if let Some(mut session_input) = input {
            if let Err(err) = session_input.send_text("", true).await {
                tracing::debug!(%err, "failed to send end-of-input marker");
            }
        }
        if let Some(receiver) = receiver {
            let _ = receiver.await;
        }

        let _ = out.send(ServerMessage::AudioStreamEnd).await;
        let _ = out
            .send(ServerMessage::LlmResponseText {
                text: spoken.clone(),
            })
            .await;

        spoken
    }
}

/// Drain audio events to the client, preserving arrival order, until
/// the provider signals final, closes, errors, or goes idle past the
/// timeout.
async fn drain_audio(
    mut output: Box<dyn SynthesisOutput>,
    out: mpsc::Sender<ServerMessage>,
    turns: TurnSequence,
    token: u64,
    idle_timeout: Duration,
) {
    let mut chunks = 0usize;
    loop {
        match tokio::time::timeout(idle_timeout, output.next_event()).await {
            Err(_) => {
                tracing::warn!("synthesis audio stream idle timeout");
                break;
            }
            Ok(Ok(None)) => break,
            Ok(Ok(Some(event))) => {
                if let Some(audio) = event.audio {
                    if turns.is_current(token) {
                        chunks += 1;
                        let _ = out
                            .send(ServerMessage::AudioChunk { audio_data: audio })
                            .await;
                    }
                }
                if event.is_final {
                    break;
                }
            }
            Ok(Err(err)) => {
                tracing::warn!(%err, "synthesis stream ended with error");
                break;
            }
        }
    }
    tracing::debug!(chunks, "audio receiver finished");
}
