//! Configuration management for the deal simulator
//!
//! Supports loading configuration from:
//! - YAML files (`config/default.yaml`, `config/{env}.yaml`)
//! - Environment variables (`DEAL_SIM__` prefix, `__` separator)
//! - Session-local user overrides (credential and model ids)
//!
//! Settings are process-wide and loaded once at startup. The per-run
//! `AnalysisConfig` is produced by `ConfigResolver` from the settings plus
//! whatever the user has overridden in the current session.

pub mod analysis;
pub mod constants;
pub mod settings;

pub use analysis::{AnalysisConfig, ConfigResolver, OverridesView, UserOverrides};
pub use settings::{
    load_settings, load_settings_from, ObservabilityConfig, ReasoningConfig, RuntimeEnvironment,
    ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("No API credential configured: set an override, reasoning.api_key, GEMINI_API_KEY or API_KEY")]
    MissingCredential,
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => ConfigError::MissingField(key),
            other => ConfigError::ParseError(other.to_string()),
        }
    }
}

impl From<ConfigError> for deal_sim_core::Error {
    fn from(err: ConfigError) -> Self {
        deal_sim_core::Error::Configuration(err.to_string())
    }
}
