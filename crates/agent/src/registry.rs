//! Session registry
//!
//! Process-wide mapping from session id to conversation state.
//! Entries are created on first touch and live for the process
//! lifetime; concurrent sessions are fully independent.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use voicebridge_core::{Turn, TurnSequence};

/// Per-session conversation state.
///
/// History is append-only and mutated only by the generation
/// orchestrator; everything else reads snapshots. The turn sequence is
/// shared with the debouncer and every downstream forwarding point for
/// stale-turn checks.
pub struct SessionState {
    id: String,
    history: RwLock<Vec<Turn>>,
    turns: TurnSequence,
    created_at: Instant,
}

impl SessionState {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            history: RwLock::new(Vec::new()),
            turns: TurnSequence::new(),
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Shared turn counter for this session.
    pub fn turns(&self) -> TurnSequence {
        self.turns.clone()
    }

    /// Is the given turn token still the latest committed turn?
    pub fn is_current(&self, token: u64) -> bool {
        self.turns.is_current(token)
    }

    /// Copy of the conversation history.
    pub fn history_snapshot(&self) -> Vec<Turn> {
        self.history.read().clone()
    }

    pub fn history_len(&self) -> usize {
        self.history.read().len()
    }

    /// Append one completed user/assistant exchange.
    pub fn append_exchange(&self, user: &str, assistant: &str) {
        let mut history = self.history.write();
        history.push(Turn::user(user));
        history.push(Turn::assistant(assistant));
    }

    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }
}

/// Process-wide session store.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<SessionState>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session, creating it on first touch.
    pub fn ensure(&self, id: &str) -> Arc<SessionState> {
        if let Some(session) = self.sessions.read().get(id) {
            return session.clone();
        }

        let mut sessions = self.sessions.write();
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::info!(session = id, "created session");
                Arc::new(SessionState::new(id))
            })
            .clone()
    }

    pub fn get(&self, id: &str) -> Option<Arc<SessionState>> {
        self.sessions.read().get(id).cloned()
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }
}
