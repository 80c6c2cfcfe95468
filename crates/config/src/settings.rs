//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Streaming pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Text generation configuration
    #[serde(default)]
    pub generation: GenerationSettings,

    /// Speech synthesis configuration
    #[serde(default)]
    pub synthesis: SynthesisSettings,
}

impl Settings {
    /// Load settings from an optional `voicebridge.toml` plus
    /// `VOICEBRIDGE_*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::with_name("voicebridge").required(false))
            .add_source(Environment::with_prefix("VOICEBRIDGE").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.debounce_ms < 100 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.debounce_ms".to_string(),
                message: "debounce window too small (minimum 100ms)".to_string(),
            });
        }

        if self.pipeline.synthesis_idle_timeout_ms < 1000 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.synthesis_idle_timeout_ms".to_string(),
                message: "idle timeout too small (minimum 1000ms)".to_string(),
            });
        }

        if self.synthesis.voice_id.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "synthesis.voice_id".to_string(),
                message: "voice id must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Streaming pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Debounce window before a final transcript commits as a turn (ms)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Idle wait on the synthesis audio stream before it is treated as
    /// ended (ms)
    #[serde(default = "default_synthesis_idle_timeout_ms")]
    pub synthesis_idle_timeout_ms: u64,

    /// Sample rate of inbound client audio (Hz)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            synthesis_idle_timeout_ms: default_synthesis_idle_timeout_ms(),
            sample_rate: default_sample_rate(),
        }
    }
}

/// Text generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Provider API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisSettings {
    /// Provider voice identifier
    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    /// Speaking style
    #[serde(default = "default_style")]
    pub style: String,

    /// Output sample rate (Hz)
    #[serde(default = "default_synthesis_sample_rate")]
    pub sample_rate: u32,

    /// Output container format
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            voice_id: default_voice_id(),
            style: default_style(),
            sample_rate: default_synthesis_sample_rate(),
            format: default_format(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_debounce_ms() -> u64 {
    1200
}

fn default_synthesis_idle_timeout_ms() -> u64 {
    10_000
}

fn default_sample_rate() -> u32 {
    16_000
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_voice_id() -> String {
    "en-US-amara".to_string()
}

fn default_style() -> String {
    "Conversational".to_string()
}

fn default_synthesis_sample_rate() -> u32 {
    44_100
}

fn default_format() -> String {
    "WAV".to_string()
}
