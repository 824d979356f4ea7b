//! Gemini backend
//!
//! Implements `ReasoningService` over the Generative Language
//! `generateContent` endpoint with JSON-mode responses constrained by a
//! response schema.
//!
//! ## Behaviour
//! - One request, one response; no streaming
//! - The credential is supplied per call, never stored in the client
//! - Thinking is enabled only for risk detection
//! - Empty model text is read as `[]`

use std::time::{Duration, Instant};

use async_trait::async_trait;
use deal_sim_config::ReasoningConfig;
use deal_sim_core::{Clause, Credential, ReasoningRequest, ReasoningService};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prompt::{detection_request, extraction_request};
use crate::schema::{clause_schema, risk_schema};
use crate::LlmError;

/// Configuration for the Gemini backend
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API base URL (overridable for testing or proxy)
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
    /// Thinking budget for risk detection; 0 disables thinking
    pub thinking_budget: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self::from_settings(&ReasoningConfig::default())
    }
}

impl GeminiConfig {
    pub fn from_settings(settings: &ReasoningConfig) -> Self {
        Self {
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(settings.timeout_seconds),
            thinking_budget: settings.thinking_budget,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = budget;
        self
    }
}

/// Gemini reasoning client
pub struct GeminiClient {
    config: GeminiConfig,
    base_url: Url,
    client: Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        if config.endpoint.is_empty() {
            return Err(LlmError::Configuration(
                "Gemini endpoint must not be empty".to_string(),
            ));
        }

        let base_url = Url::parse(&config.endpoint)
            .map_err(|e| LlmError::Configuration(format!("Invalid Gemini endpoint: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(LlmError::Configuration(format!(
                "Gemini endpoint cannot carry a path: {}",
                config.endpoint
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;

        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    /// `{endpoint}/v1beta/models/{model}:generateContent` with the model id
    /// as one percent-encoded path segment
    fn generate_url(&self, model_id: &str) -> Result<Url, LlmError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                LlmError::Configuration(format!(
                    "Gemini endpoint cannot carry a path: {}",
                    self.config.endpoint
                ))
            })?
            .pop_if_empty()
            .push("v1beta")
            .push("models")
            .push(&format!("{model_id}:generateContent"));
        Ok(url)
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Send one request and return the parsed JSON payload
    pub async fn generate(
        &self,
        credential: &Credential,
        request: &ReasoningRequest,
        response_schema: Value,
        thinking_budget: Option<u32>,
    ) -> Result<Value, LlmError> {
        if credential.is_empty() {
            return Err(LlmError::Configuration("API credential is empty".to_string()));
        }

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.prompt.clone()),
                    thought: None,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema,
                thinking_config: thinking_budget
                    .filter(|budget| *budget > 0)
                    .map(|thinking_budget| ThinkingConfig { thinking_budget }),
            },
        };

        let url = self.generate_url(&request.model_id)?;
        let start = Instant::now();
        tracing::debug!(
            operation = %request.operation,
            model = %request.model_id,
            prompt_chars = request.prompt.len(),
            "Dispatching Gemini request"
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", credential.expose())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &error_text));
        }

        let response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text = response.into_text()?;
        tracing::debug!(
            operation = %request.operation,
            model = %request.model_id,
            response_chars = text.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Gemini request completed"
        );

        parse_payload(&text)
    }
}

#[async_trait]
impl ReasoningService for GeminiClient {
    async fn extract(
        &self,
        credential: &Credential,
        model_id: &str,
        document_text: &str,
    ) -> deal_sim_core::Result<Value> {
        let request = extraction_request(model_id, document_text);
        Ok(self
            .generate(credential, &request, clause_schema(), None)
            .await?)
    }

    async fn detect_risks(
        &self,
        credential: &Credential,
        model_id: &str,
        clauses: &[Clause],
    ) -> deal_sim_core::Result<Value> {
        let request = detection_request(model_id, clauses)?;
        Ok(self
            .generate(
                credential,
                &request,
                risk_schema(),
                Some(self.config.thinking_budget),
            )
            .await?)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Map a non-success HTTP status to an error, keeping the service's message
fn classify_status(status: StatusCode, body: &str) -> LlmError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited(message),
        _ => LlmError::Api(format!("HTTP {}: {}", status, message)),
    }
}

/// Empty text is read as an empty array
fn parse_payload(text: &str) -> Result<Value, LlmError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Value::Array(Vec::new()));
    }
    serde_json::from_str(text).map_err(|e| LlmError::MalformedPayload(e.to_string()))
}

// =============================================================================
// Gemini API Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    /// Set on thought-summary parts, which are not part of the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenated answer text of the first candidate
    fn into_text(self) -> Result<String, LlmError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);

        let candidate = self.candidates.into_iter().next().ok_or_else(|| {
            LlmError::Api(match block_reason {
                Some(reason) => format!("No candidates returned (prompt blocked: {reason})"),
                None => "No candidates returned".to_string(),
            })
        })?;

        Ok(candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|part| part.thought != Some(true))
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    #[allow(dead_code)] // Kept for debug output
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
