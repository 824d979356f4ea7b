//! Pipeline Orchestrator
//!
//! Runs one analysis: truncate, extract, validate, detect, validate. Each
//! stage starts only after the previous one validated, and any failure aborts
//! the run with the typed error. Progress is reported through a callback and
//! never decreases within a run.

use std::sync::Arc;
use std::time::Instant;

use deal_sim_config::{AnalysisConfig, ReasoningConfig};
use deal_sim_core::{Clause, ReasoningService, Result, RiskRecord};

use crate::validator::validate;

/// Progress checkpoints (percent)
pub mod progress {
    /// Set by the session when a document is accepted
    pub const UPLOADED: u8 = 5;
    /// Clause extraction request issued
    pub const EXTRACTION_DISPATCHED: u8 = 15;
    /// Clauses validated, risk detection request issued
    pub const DETECTION_DISPATCHED: u8 = 45;
    /// Risks validated
    pub const COMPLETE: u8 = 100;
}

/// Validated results of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisOutput {
    pub clauses: Vec<Clause>,
    pub risks: Vec<RiskRecord>,
}

/// Stateless two-stage orchestrator, shareable across runs
pub struct Orchestrator {
    service: Arc<dyn ReasoningService>,
    max_document_chars: usize,
}

impl Orchestrator {
    pub fn new(service: Arc<dyn ReasoningService>, max_document_chars: usize) -> Self {
        Self {
            service,
            max_document_chars,
        }
    }

    pub fn from_settings(service: Arc<dyn ReasoningService>, settings: &ReasoningConfig) -> Self {
        Self::new(service, settings.max_document_chars)
    }

    pub fn max_document_chars(&self) -> usize {
        self.max_document_chars
    }

    /// Run both stages over `document_text`
    ///
    /// Emits 15, 45 and 100 through `on_progress`; nothing is emitted after
    /// a failure.
    pub async fn run<F>(
        &self,
        document_text: &str,
        config: &AnalysisConfig,
        mut on_progress: F,
    ) -> Result<AnalysisOutput>
    where
        F: FnMut(u8) + Send,
    {
        let text = truncate_chars(document_text, self.max_document_chars);
        if text.len() < document_text.len() {
            tracing::debug!(
                limit = self.max_document_chars,
                original_bytes = document_text.len(),
                kept_bytes = text.len(),
                "Document truncated before extraction"
            );
        }

        // Stage 1: extraction
        let start = Instant::now();
        tracing::info!(
            backend = self.service.name(),
            model = %config.extraction_model_id,
            chars = text.chars().count(),
            "Dispatching clause extraction"
        );
        on_progress(progress::EXTRACTION_DISPATCHED);

        let clauses = self
            .service
            .extract(&config.credential, &config.extraction_model_id, text)
            .await
            .and_then(|raw| Ok(validate::<Clause>(&raw)?))
            .map_err(|e| {
                tracing::warn!(stage = "extract", code = e.code(), error = %e, "Clause extraction failed");
                e
            })?;

        tracing::info!(
            clauses = clauses.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Clause extraction completed"
        );

        // Stage 2: risk detection over the validated clause set
        let start = Instant::now();
        tracing::info!(
            backend = self.service.name(),
            model = %config.reasoning_model_id,
            clauses = clauses.len(),
            "Dispatching risk detection"
        );
        on_progress(progress::DETECTION_DISPATCHED);

        let risks = self
            .service
            .detect_risks(&config.credential, &config.reasoning_model_id, &clauses)
            .await
            .and_then(|raw| Ok(validate::<RiskRecord>(&raw)?))
            .map_err(|e| {
                tracing::warn!(stage = "detect_risks", code = e.code(), error = %e, "Risk detection failed");
                e
            })?;

        tracing::info!(
            risks = risks.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Risk detection completed"
        );
        on_progress(progress::COMPLETE);

        Ok(AnalysisOutput { clauses, risks })
    }
}

/// Prefix of `text` holding at most `max_chars` characters
///
/// Never splits a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
