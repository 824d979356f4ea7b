//! Deal Simulator Server
//!
//! JSON HTTP surface over one analysis session.

pub mod http;
pub mod state;

pub use http::create_router;
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Reasoning service error: {0}")]
    Service(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl ServerError {
    pub fn code(&self) -> &'static str {
        match self {
            ServerError::Configuration(_) => "CONFIGURATION_ERROR",
            ServerError::Service(_) => "SERVICE_ERROR",
            ServerError::Schema(_) => "SCHEMA_ERROR",
            ServerError::InvalidRequest(_) => "INVALID_REQUEST",
            ServerError::NotFound(_) => "NOT_FOUND",
            ServerError::Conflict(_) => "CONFLICT",
        }
    }
}

impl From<&ServerError> for StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::Configuration(_) => StatusCode::BAD_REQUEST,
            ServerError::Service(_) => StatusCode::BAD_GATEWAY,
            ServerError::Schema(_) => StatusCode::BAD_GATEWAY,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl From<deal_sim_core::Error> for ServerError {
    fn from(err: deal_sim_core::Error) -> Self {
        use deal_sim_core::Error;

        match err {
            Error::Configuration(msg) => ServerError::Configuration(msg),
            Error::Service(e) => ServerError::Service(e.to_string()),
            Error::Schema(e) => ServerError::Schema(e.to_string()),
        }
    }
}

impl From<deal_sim_llm::LlmError> for ServerError {
    fn from(err: deal_sim_llm::LlmError) -> Self {
        deal_sim_core::Error::from(err).into()
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        }

        let body = Json(serde_json::json!({
            "error": self.code(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
