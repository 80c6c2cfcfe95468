//! Application state
//!
//! Shared state across all handlers.

use std::sync::Arc;

use voicebridge_agent::SessionRegistry;
use voicebridge_config::Settings;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub settings: Arc<Settings>,
    /// Session registry
    pub registry: Arc<SessionRegistry>,
    /// Shared HTTP client for the generation provider and tool
    /// backends
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
            registry: Arc::new(SessionRegistry::new()),
            http: reqwest::Client::new(),
        }
    }
}
