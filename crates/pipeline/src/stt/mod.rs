//! Transcription bridge
//!
//! The transcription provider's native execution model is blocking and
//! callback-driven: its session occupies a thread while pulling audio
//! frames and invoking callbacks on transcript and error events. The
//! bridge runs one such session per connection on a dedicated worker
//! thread and translates its callbacks into pipeline events delivered
//! through a thread-safe channel. Async-only primitives are never
//! touched from the callback thread.

pub mod assemblyai;

pub use assemblyai::AssemblyAiSession;

use tokio::sync::mpsc;

use voicebridge_core::TranscriptFragment;

use crate::ingress::FrameSource;

/// Event handed from the transcription worker into the async pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// An incremental transcript, in provider emission order.
    Fragment(TranscriptFragment),
    /// The provider session failed. Terminal; no restart is attempted.
    Error(String),
    /// The session finished. Always the last event.
    Ended,
}

/// Callback target handed to the blocking session.
#[derive(Clone)]
pub struct TranscriptSink {
    tx: mpsc::UnboundedSender<BridgeEvent>,
}

impl TranscriptSink {
    pub(crate) fn new(tx: mpsc::UnboundedSender<BridgeEvent>) -> Self {
        Self { tx }
    }

    /// Deliver a transcript fragment. Safe to call from any thread.
    pub fn fragment(&self, fragment: TranscriptFragment) {
        let _ = self.tx.send(BridgeEvent::Fragment(fragment));
    }

    /// Deliver a terminal provider error.
    pub fn error(&self, message: impl Into<String>) {
        let _ = self.tx.send(BridgeEvent::Error(message.into()));
    }
}

/// A blocking, callback-driven transcription session.
///
/// `run` owns its worker thread until the frame source yields the
/// end-of-stream sentinel or the provider fails; it must return
/// promptly after either.
pub trait TranscriberSession: Send + 'static {
    fn run(self: Box<Self>, frames: FrameSource, sink: TranscriptSink);
}

/// Runs a [`TranscriberSession`] on a dedicated worker thread and
/// exposes its events as an async stream.
pub struct TranscriptionBridge {
    events: mpsc::UnboundedReceiver<BridgeEvent>,
}

impl TranscriptionBridge {
    /// Spawn the worker. One attempt per session; the bridge emits
    /// [`BridgeEvent::Ended`] when the session returns.
    pub fn spawn(session: Box<dyn TranscriberSession>, frames: FrameSource) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let sink = TranscriptSink::new(tx.clone());
        let done = tx.clone();

        let spawned = std::thread::Builder::new()
            .name("transcriber".to_string())
            .spawn(move || {
                session.run(frames, sink);
                let _ = done.send(BridgeEvent::Ended);
            });

        if let Err(err) = spawned {
            let _ = tx.send(BridgeEvent::Error(format!(
                "failed to spawn transcriber worker: {err}"
            )));
            let _ = tx.send(BridgeEvent::Ended);
        }

        Self { events }
    }

    /// Next bridge event; `None` after `Ended` has been consumed and
    /// the worker is gone.
    pub async fn next_event(&mut self) -> Option<BridgeEvent> {
        self.events.recv().await
    }
}
