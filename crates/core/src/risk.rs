//! Detected risk records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Literals accepted on the wire (case-sensitive)
    pub const LITERALS: &'static [&'static str] = &["Critical", "High", "Medium", "Low"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rating for one impact axis (recovery, control, timing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
}

impl ImpactLevel {
    pub const LITERALS: &'static [&'static str] = &["Low", "Medium", "High"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactLevel::Low => "Low",
            ImpactLevel::Medium => "Medium",
            ImpactLevel::High => "High",
        }
    }

    /// Filled bars on a three-bar impact meter
    pub fn bars(&self) -> u8 {
        match self {
            ImpactLevel::Low => 1,
            ImpactLevel::Medium => 2,
            ImpactLevel::High => 3,
        }
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structural vulnerability tied to evidence and an exploitation scenario
///
/// `adversarial_highlight` is expected to occur inside `evidence_snippet`,
/// but nothing upstream guarantees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRecord {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub severity: Severity,
    pub affected_clauses: Vec<String>,
    pub rule_logic: String,
    pub rule_label: String,
    pub evidence_snippet: String,
    pub scenario_title: String,
    pub scenario_narrative: String,
    pub scenario_impact: String,
    pub recovery_risk: ImpactLevel,
    pub control_risk: ImpactLevel,
    pub timing_risk: ImpactLevel,
    pub adversarial_highlight: String,
}

impl RiskRecord {
    /// First affected clause reference, shown as the section reference
    pub fn section_reference(&self) -> Option<&str> {
        self.affected_clauses.first().map(String::as_str)
    }

    /// Whether the highlight phrase actually occurs in the evidence
    pub fn highlight_in_evidence(&self) -> bool {
        !self.adversarial_highlight.is_empty()
            && self.evidence_snippet.contains(&self.adversarial_highlight)
    }
}

/// Headline rating for a whole agreement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealRiskRating {
    /// No risks on record
    Unscanned,
    Elevated,
    High,
    Critical,
}

impl DealRiskRating {
    pub fn from_risks(risks: &[RiskRecord]) -> Self {
        match risks.iter().map(|r| r.severity).max() {
            None => DealRiskRating::Unscanned,
            Some(Severity::Critical) => DealRiskRating::Critical,
            Some(Severity::High) => DealRiskRating::High,
            Some(_) => DealRiskRating::Elevated,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DealRiskRating::Unscanned => "UNSCANNED",
            DealRiskRating::Elevated => "ELEVATED",
            DealRiskRating::High => "HIGH",
            DealRiskRating::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for DealRiskRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
