//! Extracted agreement clauses

use serde::{Deserialize, Serialize};
use std::fmt;

/// Clause categories requested from the extraction stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseCategory {
    UnrestrictedSubsidiaries,
    Investments,
    DebtIncurrence,
    AssetTransfers,
    ChangeOfControl,
}

impl ClauseCategory {
    pub const ALL: [ClauseCategory; 5] = [
        ClauseCategory::UnrestrictedSubsidiaries,
        ClauseCategory::Investments,
        ClauseCategory::DebtIncurrence,
        ClauseCategory::AssetTransfers,
        ClauseCategory::ChangeOfControl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseCategory::UnrestrictedSubsidiaries => "Unrestricted Subsidiaries",
            ClauseCategory::Investments => "Investments",
            ClauseCategory::DebtIncurrence => "Debt Incurrence",
            ClauseCategory::AssetTransfers => "Asset Transfers",
            ClauseCategory::ChangeOfControl => "Change of Control",
        }
    }
}

impl fmt::Display for ClauseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verbatim contractual excerpt tagged with category and section reference
///
/// `id` is only unique within the extraction run that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clause {
    pub id: String,
    pub category: String,
    pub section_reference: String,
    pub text: String,
    pub summary: String,
}
