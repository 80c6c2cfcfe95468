//! Configuration for the voice conversation bridge

mod settings;

pub use settings::{
    GenerationSettings, PipelineSettings, ServerConfig, Settings, SynthesisSettings,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
