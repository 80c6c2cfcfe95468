//! Murf streaming synthesis session
//!
//! Async client for the stream-input endpoint: voice configuration is
//! sent first, then `{text, end}` increments; the provider answers
//! with base64 audio events and a final flag.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::tts::{SpeechSynthesizer, SynthesisConfig, SynthesisEvent, SynthesisInput, SynthesisOutput};
use crate::PipelineError;

const STREAM_INPUT_ENDPOINT: &str = "wss://api.murf.ai/v1/speech/stream-input";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct MurfSynthesizer {
    api_key: String,
    config: SynthesisConfig,
}

impl MurfSynthesizer {
    pub fn new(api_key: impl Into<String>, config: SynthesisConfig) -> Self {
        Self {
            api_key: api_key.into(),
            config,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for MurfSynthesizer {
    async fn open(
        &self,
    ) -> Result<(Box<dyn SynthesisInput>, Box<dyn SynthesisOutput>), PipelineError> {
        let url = format!(
            "{STREAM_INPUT_ENDPOINT}?api-key={}&sample_rate={}&channel_type=MONO&format={}",
            self.api_key, self.config.sample_rate, self.config.format
        );

        let (stream, _response) = connect_async(&url)
            .await
            .map_err(|err| PipelineError::Synthesis(format!("connect failed: {err}")))?;
        let (mut sink, stream) = stream.split();

        let voice_config = json!({
            "voice_config": {
                "voiceId": self.config.voice_id,
                "style": self.config.style,
            }
        });
        sink.send(Message::Text(voice_config.to_string()))
            .await
            .map_err(|err| PipelineError::Synthesis(format!("voice config send failed: {err}")))?;

        tracing::info!(voice = %self.config.voice_id, "synthesis session open");
        Ok((Box::new(MurfInput { sink }), Box::new(MurfOutput { stream })))
    }
}

struct MurfInput {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl SynthesisInput for MurfInput {
    async fn send_text(&mut self, text: &str, end: bool) -> Result<(), PipelineError> {
        let payload = json!({ "text": text, "end": end });
        self.sink
            .send(Message::Text(payload.to_string()))
            .await
            .map_err(|err| PipelineError::Synthesis(format!("text send failed: {err}")))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProviderEvent {
    #[serde(default)]
    audio: Option<String>,
    #[serde(default, rename = "final")]
    is_final: bool,
}

struct MurfOutput {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl SynthesisOutput for MurfOutput {
    async fn next_event(&mut self) -> Result<Option<SynthesisEvent>, PipelineError> {
        while let Some(message) = self.stream.next().await {
            match message {
                Ok(Message::Text(raw)) => match serde_json::from_str::<ProviderEvent>(&raw) {
                    Ok(event) => {
                        return Ok(Some(SynthesisEvent {
                            audio: event.audio,
                            is_final: event.is_final,
                        }))
                    }
                    Err(err) => {
                        tracing::debug!(%err, "unrecognized synthesis event");
                    }
                },
                Ok(Message::Close(_)) => return Ok(None),
                Ok(_) => {}
                Err(err) => {
                    return Err(PipelineError::Synthesis(format!("stream read failed: {err}")))
                }
            }
        }
        Ok(None)
    }
}
