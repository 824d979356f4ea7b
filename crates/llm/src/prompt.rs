//! Prompt construction for the two reasoning stages

use deal_sim_core::{Clause, ClauseCategory, FocusTheme, Operation, ReasoningRequest};

use crate::LlmError;

/// Stage 1: verbatim clause extraction
///
/// `document_text` is expected to be already truncated by the caller.
pub fn extraction_request(model_id: &str, document_text: &str) -> ReasoningRequest {
    let categories = ClauseCategory::ALL
        .iter()
        .map(ClauseCategory::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let prompt = format!(
        "Analyze this credit agreement. Extract verbatim clauses for: {categories}.\n\
         For each clause give a short id, the category, the section reference as written in \
         the agreement, the exact clause text and a one-sentence summary.\n\n\
         Document Text: {document_text}"
    );

    ReasoningRequest::new(Operation::Extract, model_id, prompt)
}

/// Stage 2: adversarial risk detection over the extracted clauses
pub fn detection_request(model_id: &str, clauses: &[Clause]) -> Result<ReasoningRequest, LlmError> {
    let clauses_json =
        serde_json::to_string(clauses).map_err(|e| LlmError::InvalidRequest(e.to_string()))?;

    let themes = FocusTheme::ALL
        .iter()
        .map(FocusTheme::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let prompt = format!(
        "Acting as an adversarial credit analyst, identify structural vulnerabilities in these \
         clauses.\n\
         Focus on: {themes}.\n\n\
         For each risk, define a specific \"Adversarial Scenario\" where a borrower exploits the \
         language.\n\
         Determine Impact Levels (Low/Medium/High) for Recovery, Control, and Timing risks.\n\
         Rate severity as exactly one of Critical, High, Medium or Low.\n\
         List the ids of the affected clauses in affectedClauses.\n\
         Quote the evidence verbatim in evidenceSnippet, and identify the specific verbatim \
         phrase within it that creates the loophole (adversarialHighlight).\n\n\
         Clauses: {clauses_json}"
    );

    Ok(ReasoningRequest::new(Operation::DetectRisks, model_id, prompt))
}
