//! AssemblyAI realtime transcription session
//!
//! Blocking client for the v3 streaming endpoint. The session holds
//! its worker thread for the connection lifetime, interleaving frame
//! pulls from the ingress queue with short-timeout socket reads so a
//! single thread can drive both directions of the socket.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tungstenite::client::IntoClientRequest;
use tungstenite::http::HeaderValue;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use voicebridge_core::TranscriptFragment;

use crate::ingress::{FramePoll, FrameSource};
use crate::stt::{TranscriberSession, TranscriptSink};
use crate::PipelineError;

const STREAMING_ENDPOINT: &str = "wss://streaming.assemblyai.com/v3/ws";
const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// How long to keep reading after the termination message was sent.
const DRAIN_DEADLINE: Duration = Duration::from_secs(5);
const TERMINATE_MESSAGE: &str = r#"{"type":"Terminate"}"#;

pub struct AssemblyAiSession {
    api_key: String,
    sample_rate: u32,
}

impl AssemblyAiSession {
    pub fn new(api_key: impl Into<String>, sample_rate: u32) -> Self {
        Self {
            api_key: api_key.into(),
            sample_rate,
        }
    }

    fn connect(&self) -> Result<WebSocket<MaybeTlsStream<TcpStream>>, PipelineError> {
        let url = format!(
            "{STREAMING_ENDPOINT}?sample_rate={}&format_turns=true",
            self.sample_rate
        );
        let mut request = url
            .into_client_request()
            .map_err(|err| PipelineError::Transcription(err.to_string()))?;
        let auth = HeaderValue::from_str(&self.api_key).map_err(|_| {
            PipelineError::Transcription("API key is not a valid header value".to_string())
        })?;
        request.headers_mut().insert("Authorization", auth);

        let (mut socket, _response) = tungstenite::connect(request)
            .map_err(|err| PipelineError::Transcription(format!("connect failed: {err}")))?;
        set_read_timeout(&mut socket, POLL_INTERVAL)?;

        tracing::info!(sample_rate = self.sample_rate, "transcription session open");
        Ok(socket)
    }

    fn stream(&self, frames: &mut FrameSource, sink: &TranscriptSink) -> Result<(), PipelineError> {
        let mut socket = self.connect()?;
        let mut draining_since: Option<Instant> = None;

        loop {
            if draining_since.is_none() {
                match frames.poll_frame(POLL_INTERVAL) {
                    FramePoll::Frame(frame) => {
                        socket.send(Message::Binary(frame)).map_err(|err| {
                            PipelineError::Transcription(format!("audio send failed: {err}"))
                        })?;
                    }
                    FramePoll::Idle => {}
                    FramePoll::Ended => {
                        let _ = socket.send(Message::Text(TERMINATE_MESSAGE.to_string()));
                        draining_since = Some(Instant::now());
                    }
                }
            }

            match socket.read() {
                Ok(Message::Text(raw)) => {
                    if dispatch(&raw, sink) {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(tungstenite::Error::Io(err))
                    if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    if let Some(since) = draining_since {
                        if since.elapsed() > DRAIN_DEADLINE {
                            tracing::warn!("transcription drain deadline elapsed");
                            break;
                        }
                    }
                }
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    break;
                }
                Err(err) => {
                    return Err(PipelineError::Transcription(format!(
                        "stream read failed: {err}"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl TranscriberSession for AssemblyAiSession {
    fn run(self: Box<Self>, mut frames: FrameSource, sink: TranscriptSink) {
        if let Err(err) = self.stream(&mut frames, &sink) {
            sink.error(err.to_string());
        }
        tracing::info!("transcription session finished");
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ProviderMessage {
    Begin {},
    Turn {
        #[serde(default)]
        transcript: String,
        #[serde(default)]
        end_of_turn: bool,
    },
    Termination {},
    #[serde(other)]
    Other,
}

/// Translate one provider frame into sink callbacks. Returns true when
/// the session is terminated.
fn dispatch(raw: &str, sink: &TranscriptSink) -> bool {
    match serde_json::from_str::<ProviderMessage>(raw) {
        Ok(ProviderMessage::Turn {
            transcript,
            end_of_turn,
        }) => {
            sink.fragment(TranscriptFragment {
                text: transcript,
                is_final: end_of_turn,
            });
            false
        }
        Ok(ProviderMessage::Termination {}) => true,
        Ok(ProviderMessage::Begin {}) | Ok(ProviderMessage::Other) => false,
        Err(err) => {
            tracing::debug!(%err, "unrecognized transcription event");
            false
        }
    }
}

fn set_read_timeout(
    socket: &mut WebSocket<MaybeTlsStream<TcpStream>>,
    timeout: Duration,
) -> Result<(), PipelineError> {
    let stream = match socket.get_mut() {
        MaybeTlsStream::Plain(stream) => stream,
        MaybeTlsStream::NativeTls(stream) => stream.get_mut(),
        _ => return Ok(()),
    };
    stream
        .set_read_timeout(Some(timeout))
        .map_err(|err| PipelineError::Transcription(format!("failed to set read timeout: {err}")))
}
