//! Core types for the voice conversation bridge
//!
//! This crate provides foundational types used across all other crates:
//! - Transcript fragments and committed turns
//! - Conversation history and turn tracking types
//! - Client/server wire messages

pub mod conversation;
pub mod message;
pub mod transcript;

pub use conversation::{CommittedTurn, Turn, TurnRole, TurnSequence};
pub use message::{ClientMessage, ServerMessage, SessionKeys};
pub use transcript::TranscriptFragment;
