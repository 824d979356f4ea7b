//! Reasoning service integration
//!
//! Features:
//! - Gemini `generateContent` backend with JSON response schemas
//! - Response schemas derived from the core record shape descriptors
//! - Prompt construction for clause extraction and risk detection
//! - Error classification (transport, auth, rate limit, api, malformed payload)
//!
//! There is no retry and no caching: a failed call fails the run.

pub mod gemini;
pub mod prompt;
pub mod schema;

pub use gemini::{GeminiClient, GeminiConfig};
pub use prompt::{detection_request, extraction_request};
pub use schema::{clause_schema, response_schema, risk_schema};

use deal_sim_core::{SchemaError, ServiceError, ServiceErrorKind};
use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error: {0}")]
    Api(String),

    /// The response envelope itself could not be read
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The model's text was not valid JSON
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(err.to_string())
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for deal_sim_core::Error {
    fn from(err: LlmError) -> Self {
        use deal_sim_core::Error;

        let service = |kind: ServiceErrorKind, message: String| Error::Service(ServiceError::new(kind, message));
        match err {
            LlmError::Network(msg) | LlmError::Timeout(msg) => {
                service(ServiceErrorKind::Transport, msg)
            }
            LlmError::Auth(msg) => service(ServiceErrorKind::Auth, msg),
            LlmError::RateLimited(msg) => service(ServiceErrorKind::RateLimited, msg),
            LlmError::Api(msg) | LlmError::InvalidResponse(msg) | LlmError::InvalidRequest(msg) => {
                service(ServiceErrorKind::Api, msg)
            }
            LlmError::MalformedPayload(msg) => Error::Schema(SchemaError::Malformed(msg)),
            LlmError::Configuration(msg) => Error::Configuration(msg),
        }
    }
}
