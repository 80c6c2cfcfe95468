//! Turn debouncer
//!
//! The transcription provider can fire several end-of-turn events for
//! one natural pause in speech. The debouncer coalesces such bursts:
//! each final fragment restarts a commit timer, and only the newest
//! transcript is committed once the timer survives the full window.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use voicebridge_core::{CommittedTurn, TranscriptFragment, TurnSequence};

/// Debounce state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// Nothing buffered.
    Idle,
    /// Partial fragments seen, no end-of-turn yet.
    AwaitingFinal,
    /// A commit timer is running.
    PendingCommit,
}

struct Shared {
    last_transcript: Mutex<String>,
    state: Mutex<DebounceState>,
}

/// Per-session debouncer. At most one commit timer is live at a time;
/// a newer final fragment cancels and restarts it with the newer text.
pub struct TurnDebouncer {
    delay: Duration,
    turns: TurnSequence,
    commits: mpsc::UnboundedSender<CommittedTurn>,
    shared: Arc<Shared>,
    pending: Option<JoinHandle<()>>,
}

impl TurnDebouncer {
    pub fn new(
        delay: Duration,
        turns: TurnSequence,
        commits: mpsc::UnboundedSender<CommittedTurn>,
    ) -> Self {
        Self {
            delay,
            turns,
            commits,
            shared: Arc::new(Shared {
                last_transcript: Mutex::new(String::new()),
                state: Mutex::new(DebounceState::Idle),
            }),
            pending: None,
        }
    }

    pub fn state(&self) -> DebounceState {
        *self.shared.state.lock()
    }

    /// Feed one transcript fragment through the state machine.
    pub fn on_fragment(&mut self, fragment: &TranscriptFragment) {
        if !fragment.is_final {
            let mut state = self.shared.state.lock();
            if *state == DebounceState::Idle {
                *state = DebounceState::AwaitingFinal;
            }
            return;
        }

        if fragment.text.trim().is_empty() {
            return;
        }

        *self.shared.last_transcript.lock() = fragment.text.clone();
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        *self.shared.state.lock() = DebounceState::PendingCommit;

        let delay = self.delay;
        let turns = self.turns.clone();
        let commits = self.commits.clone();
        let shared = self.shared.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let text = shared.last_transcript.lock().clone();
            *shared.state.lock() = DebounceState::Idle;
            if text.is_empty() {
                return;
            }

            let token = turns.advance();
            tracing::info!(token, transcript = %text, "turn committed");
            let _ = commits.send(CommittedTurn { text, token });
        }));
    }

    /// Cancel any pending commit without emitting anything.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        *self.shared.state.lock() = DebounceState::Idle;
    }
}

impl Drop for TurnDebouncer {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}
