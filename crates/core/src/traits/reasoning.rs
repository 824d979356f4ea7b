//! Reasoning service interface

use crate::{Clause, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Opaque API credential
///
/// Never printed and never serialised. Call [`Credential::expose`] only at the
/// point where the value is written into a request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Logical operation requested from the reasoning service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Stage 1: pull categorised clauses out of the raw document
    Extract,
    /// Stage 2: find exploitable risks across the extracted clauses
    DetectRisks,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Extract => "extract",
            Operation::DetectRisks => "detect_risks",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request to the reasoning service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningRequest {
    pub operation: Operation,
    pub model_id: String,
    pub prompt: String,
}

impl ReasoningRequest {
    pub fn new(operation: Operation, model_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            operation,
            model_id: model_id.into(),
            prompt: prompt.into(),
        }
    }
}

/// External structured-reasoning collaborator
///
/// Implementations:
/// - `GeminiClient` - Google Gemini `generateContent` with response schemas
///
/// Both operations return the raw JSON payload. Shape checking is the
/// caller's job, so implementations must not coerce or repair the output.
///
/// # Example
///
/// ```ignore
/// let service: Arc<dyn ReasoningService> = Arc::new(GeminiClient::new(config)?);
/// let raw = service.extract(&credential, "gemini-3-flash-preview", text).await?;
/// let clauses: Vec<Clause> = validate(&raw)?;
/// ```
#[async_trait]
pub trait ReasoningService: Send + Sync + 'static {
    /// Extract categorised clauses from document text
    async fn extract(
        &self,
        credential: &Credential,
        model_id: &str,
        document_text: &str,
    ) -> Result<Value>;

    /// Detect adversarial risks across a validated clause set
    async fn detect_risks(
        &self,
        credential: &Credential,
        model_id: &str,
        clauses: &[Clause],
    ) -> Result<Value>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
