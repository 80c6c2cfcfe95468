//! Voice bridge server
//!
//! WebSocket endpoint wiring the per-session streaming pipeline:
//! client audio in, transcription, turn debouncing, tool-augmented
//! generation, synthesized audio back out.

pub mod http;
pub mod state;
pub mod websocket;

pub use http::create_router;
pub use state::AppState;
