//! Error types shared across the workspace

use std::fmt;
use thiserror::Error;

/// Result alias using the core error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort an analysis run
///
/// Highlight mismatches are not represented here: the resolver falls back to
/// an unhighlighted rendering instead of failing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No usable credential, or invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transport, authentication or rate-limit failure from the reasoning service
    #[error("Service error: {0}")]
    Service(ServiceError),

    /// The reasoning service returned a payload of the wrong shape
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

impl Error {
    /// Short machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "CONFIGURATION_ERROR",
            Error::Service(_) => "SERVICE_ERROR",
            Error::Schema(_) => "SCHEMA_ERROR",
        }
    }
}

impl From<ServiceError> for Error {
    fn from(err: ServiceError) -> Self {
        Error::Service(err)
    }
}

/// Category of a service failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// Connection failure or timeout
    Transport,
    /// Credential rejected
    Auth,
    /// Too many requests
    RateLimited,
    /// Any other non-success answer from the service
    Api,
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceErrorKind::Transport => write!(f, "transport"),
            ServiceErrorKind::Auth => write!(f, "auth"),
            ServiceErrorKind::RateLimited => write!(f, "rate limited"),
            ServiceErrorKind::Api => write!(f, "api"),
        }
    }
}

/// Failure reported by the reasoning collaborator, message kept verbatim
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Payload validation failure naming the first offending field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("payload is not valid JSON: {0}")]
    Malformed(String),

    #[error("expected a JSON array of {entity} records")]
    NotAnArray { entity: &'static str },

    #[error("{entity}[{index}] is missing required field `{field}`")]
    MissingField {
        entity: &'static str,
        index: usize,
        field: &'static str,
    },

    #[error("{entity}[{index}].{field} has the wrong type, expected {expected}")]
    WrongType {
        entity: &'static str,
        index: usize,
        field: &'static str,
        expected: &'static str,
    },

    #[error("{entity}[{index}].{field} has value {value:?}, expected one of {allowed:?}")]
    InvalidValue {
        entity: &'static str,
        index: usize,
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },
}

impl SchemaError {
    /// Name of the offending field, if the error is field-specific
    pub fn field(&self) -> Option<&'static str> {
        match self {
            SchemaError::MissingField { field, .. }
            | SchemaError::WrongType { field, .. }
            | SchemaError::InvalidValue { field, .. } => Some(field),
            SchemaError::Malformed(_) | SchemaError::NotAnArray { .. } => None,
        }
    }
}
