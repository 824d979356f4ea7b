//! Record shape descriptors
//!
//! Single source of truth for the required fields of each record produced by
//! the reasoning service. The pipeline validates payloads against these, and
//! the service client derives its response schemas from them.

use crate::risk::{ImpactLevel, Severity};

/// JSON kind a required field must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A JSON string
    Text,
    /// A JSON array of strings
    TextList,
    /// A JSON string equal to one of the literals (case-sensitive)
    OneOf(&'static [&'static str]),
}

impl FieldKind {
    /// Human-readable description used in error messages
    pub fn expected(&self) -> &'static str {
        match self {
            FieldKind::Text | FieldKind::OneOf(_) => "string",
            FieldKind::TextList => "array of strings",
        }
    }
}

/// A required field of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Text,
    }
}

pub const CLAUSE_FIELDS: &[FieldSpec] = &[
    text("id"),
    text("category"),
    text("sectionReference"),
    text("text"),
    text("summary"),
];

pub const RISK_FIELDS: &[FieldSpec] = &[
    text("id"),
    text("title"),
    text("category"),
    text("description"),
    FieldSpec {
        name: "severity",
        kind: FieldKind::OneOf(Severity::LITERALS),
    },
    FieldSpec {
        name: "affectedClauses",
        kind: FieldKind::TextList,
    },
    text("ruleLogic"),
    text("ruleLabel"),
    text("evidenceSnippet"),
    text("scenarioTitle"),
    text("scenarioNarrative"),
    text("scenarioImpact"),
    FieldSpec {
        name: "recoveryRisk",
        kind: FieldKind::OneOf(ImpactLevel::LITERALS),
    },
    FieldSpec {
        name: "controlRisk",
        kind: FieldKind::OneOf(ImpactLevel::LITERALS),
    },
    FieldSpec {
        name: "timingRisk",
        kind: FieldKind::OneOf(ImpactLevel::LITERALS),
    },
    text("adversarialHighlight"),
];
