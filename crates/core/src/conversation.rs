//! Conversation history and turn tracking types

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One entry in a session's conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A finalized unit of user speech, committed by the turn debouncer.
///
/// The token is allocated from the session's [`TurnSequence`] at commit
/// time; downstream stages compare it against the sequence before every
/// forward so that work for a superseded turn stops flowing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedTurn {
    pub text: String,
    pub token: u64,
}

/// Monotonic per-session turn counter shared between the debouncer and
/// every downstream forwarding point.
///
/// A turn is "current" exactly while no newer turn has been committed.
#[derive(Debug, Clone, Default)]
pub struct TurnSequence(Arc<AtomicU64>);

impl TurnSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next turn token, making it the latest.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Latest committed token (0 if no turn has committed yet).
    pub fn latest(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Is the given token still the latest committed turn?
    pub fn is_current(&self, token: u64) -> bool {
        self.latest() == token
    }
}
