//! Session state and its public snapshot

use chrono::{DateTime, Utc};
use deal_sim_core::{Clause, DealRiskRating, Document, RiskRecord};
use serde::Serialize;
use std::fmt;

/// Phase of the analysis lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AnalysisPhase {
    /// No run in progress
    Idle,
    /// Clause extraction running
    Extracting,
    /// Risk detection running
    Detecting,
    /// Results committed
    Ready,
    /// Last run failed; nothing committed
    Failed,
}

impl AnalysisPhase {
    /// Phases reachable from this one
    pub fn allowed_transitions(&self) -> &'static [AnalysisPhase] {
        use AnalysisPhase::*;
        match self {
            Idle => &[Extracting, Failed],
            Extracting => &[Detecting, Failed, Idle],
            Detecting => &[Ready, Failed, Idle],
            Ready => &[Idle, Failed],
            Failed => &[Idle],
        }
    }

    pub fn can_transition_to(&self, target: AnalysisPhase) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// A run is in flight
    pub fn is_running(&self) -> bool {
        matches!(self, AnalysisPhase::Extracting | AnalysisPhase::Detecting)
    }

    /// Selection and highlight toggling are allowed
    pub fn accepts_interaction(&self) -> bool {
        matches!(self, AnalysisPhase::Idle | AnalysisPhase::Ready)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisPhase::Idle => "idle",
            AnalysisPhase::Extracting => "extracting",
            AnalysisPhase::Detecting => "detecting",
            AnalysisPhase::Ready => "ready",
            AnalysisPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one session knows
///
/// `selected_risk_id`, when set, always names a risk in `risks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub document: Option<Document>,
    pub clauses: Vec<Clause>,
    pub risks: Vec<RiskRecord>,
    pub selected_risk_id: Option<String>,
    pub phase: AnalysisPhase,
    /// Percent complete, 0..=100
    pub progress: u8,
    pub highlight_mode_enabled: bool,
    pub last_error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            document: None,
            clauses: Vec::new(),
            risks: Vec::new(),
            selected_risk_id: None,
            phase: AnalysisPhase::Idle,
            progress: 0,
            highlight_mode_enabled: true,
            last_error: None,
        }
    }
}

impl SessionState {
    pub fn selected_risk(&self) -> Option<&RiskRecord> {
        let id = self.selected_risk_id.as_deref()?;
        self.risks.iter().find(|r| r.id == id)
    }

    pub fn has_risk(&self, risk_id: &str) -> bool {
        self.risks.iter().any(|r| r.id == risk_id)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            progress: self.progress,
            document_name: self.document.as_ref().map(|d| d.name().to_string()),
            document_loaded_at: self.document.as_ref().map(Document::loaded_at),
            clause_count: self.clauses.len(),
            risk_count: self.risks.len(),
            selected_risk_id: self.selected_risk_id.clone(),
            highlight_mode_enabled: self.highlight_mode_enabled,
            deal_rating: DealRiskRating::from_risks(&self.risks),
            last_error: self.last_error.clone(),
        }
    }
}

/// Serializable summary of a session, taken under the session lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: AnalysisPhase,
    pub progress: u8,
    pub document_name: Option<String>,
    pub document_loaded_at: Option<DateTime<Utc>>,
    pub clause_count: usize,
    pub risk_count: usize,
    pub selected_risk_id: Option<String>,
    pub highlight_mode_enabled: bool,
    pub deal_rating: DealRiskRating,
    pub last_error: Option<String>,
}
