//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{endpoints, limits, models, timeouts};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Reasoning service configuration
    #[serde(default)]
    pub reasoning: ReasoningConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_reasoning()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if self.environment.is_production() && server.cors_enabled && server.cors_origins.is_empty()
        {
            tracing::warn!("CORS enabled in production without explicit origins, falling back to localhost");
        }

        Ok(())
    }

    fn validate_reasoning(&self) -> Result<(), ConfigError> {
        let reasoning = &self.reasoning;

        if reasoning.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reasoning.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if reasoning.max_document_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reasoning.max_document_chars".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        for (field, value) in [
            ("reasoning.extraction_model", &reasoning.extraction_model),
            ("reasoning.reasoning_model", &reasoning.reasoning_model),
            ("reasoning.endpoint", &reasoning.endpoint),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "Must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_server_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins; empty means localhost:3000 only
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_server_timeout() -> u64 {
    timeouts::SERVER_REQUEST_SECS
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_server_timeout(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
        }
    }
}

/// Reasoning service configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// Process-default API key; empty falls back to `GEMINI_API_KEY`, then `API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: String,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_extraction_model")]
    pub extraction_model: String,

    #[serde(default = "default_reasoning_model")]
    pub reasoning_model: String,

    #[serde(default = "default_reasoning_timeout")]
    pub timeout_seconds: u64,

    /// Thinking budget for risk detection; 0 disables thinking
    #[serde(default = "default_thinking_budget")]
    pub thinking_budget: u32,

    #[serde(default = "default_max_document_chars")]
    pub max_document_chars: usize,
}

fn default_endpoint() -> String {
    endpoints::GEMINI_DEFAULT.to_string()
}
fn default_extraction_model() -> String {
    models::EXTRACTION_DEFAULT.to_string()
}
fn default_reasoning_model() -> String {
    models::REASONING_DEFAULT.to_string()
}
fn default_reasoning_timeout() -> u64 {
    timeouts::REASONING_REQUEST_SECS
}
fn default_thinking_budget() -> u32 {
    limits::THINKING_BUDGET
}
fn default_max_document_chars() -> usize {
    limits::MAX_DOCUMENT_CHARS
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_endpoint(),
            extraction_model: default_extraction_model(),
            reasoning_model: default_reasoning_model(),
            timeout_seconds: default_reasoning_timeout(),
            thinking_budget: default_thinking_budget(),
            max_document_chars: default_max_document_chars(),
        }
    }
}

impl std::fmt::Debug for ReasoningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningConfig")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("endpoint", &self.endpoint)
            .field("extraction_model", &self.extraction_model)
            .field("reasoning_model", &self.reasoning_model)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("thinking_budget", &self.thinking_budget)
            .field("max_document_chars", &self.max_document_chars)
            .finish()
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from `config/` relative to the working directory
///
/// Priority (highest to lowest):
/// 1. Environment variables (DEAL_SIM__ prefix, e.g. `DEAL_SIM__SERVER__PORT`)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
/// 4. Built-in defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from an explicit configuration directory
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    let default_path = dir.join("default");
    builder = builder.add_source(File::with_name(&default_path.to_string_lossy()).required(false));

    if let Some(env_name) = env {
        let env_path = dir.join(env_name);
        builder = builder.add_source(File::with_name(&env_path.to_string_lossy()).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("DEAL_SIM")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    tracing::debug!(
        environment = ?settings.environment,
        extraction_model = %settings.reasoning.extraction_model,
        reasoning_model = %settings.reasoning.reasoning_model,
        "Settings loaded"
    );

    Ok(settings)
}
