//! Adversarial pattern catalogue
//!
//! Static reference material surfaced alongside analysis results. None of it
//! drives detection; the reasoning service owns all semantic judgement.

use serde::Serialize;

/// A known liability-management pattern the detector looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdversarialPattern {
    pub name: &'static str,
    pub description: &'static str,
    pub logic: &'static str,
}

pub const ADVERSARIAL_PATTERNS: &[AdversarialPattern] = &[
    AdversarialPattern {
        name: "J.Crew / Unrestricted Subsidiary Trap",
        description: "Identifies whether specific investment baskets allow for the transfer of \
            material IP or assets to unrestricted subsidiaries, potentially removing them from \
            the collateral package.",
        logic: "Cross-references 'Investments' baskets with 'Negative Pledge' exceptions and \
            'Unrestricted Subsidiary' definitions.",
    },
    AdversarialPattern {
        name: "Serta-style Non-Pro-Rata Priming",
        description: "Detects language in the 'Amendments' or 'Required Lenders' sections that \
            could allow a subset of lenders to modify payment priority or collateral rights \
            without 100% lender consent.",
        logic: "Analyzes 'Sacred Rights' clauses for omissions regarding payment subordination \
            or 'uptiering' transactions.",
    },
    AdversarialPattern {
        name: "Chewy-style Automatic Release",
        description: "Scans for automatic guarantee or lien releases triggered by 'Investments' \
            or 'Asset Sales' to non-wholly owned subsidiaries.",
        logic: "Examines 'Guarantees' and 'Lien Release' sections for mandatory discharge upon \
            transfer to a non-guarantor affiliate.",
    },
    AdversarialPattern {
        name: "EBITDA Add-back Dilution",
        description: "Flags excessive or uncapped 'Expected Synergies' or 'Restructuring Costs' \
            that artificially inflate Consolidated EBITDA for covenant compliance.",
        logic: "Calculates the interaction between 'Consolidated EBITDA' definitions and \
            'Negative Covenant' leverage ratios.",
    },
];

/// Disclaimers shown with every analysis
pub const SYSTEM_LIMITATIONS: &[&str] = &[
    "This system does not provide legal advice or legal conclusions.",
    "The analysis is deterministic and rule-based, focusing only on explicit contractual language.",
    "It does not predict transaction likelihood or market outcomes.",
    "The system does not assess the creditworthiness of any entity.",
    "It is not a substitute for professional legal or financial counsel.",
];

/// Themes the risk-detection prompt asks the model to focus on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusTheme {
    UnrestrictedSubsidiaryLeakage,
    AssetTransferLeakage,
    DebtIncurrence,
    CurePeriodAbuse,
    ChangeOfControl,
    EbitdaDefinitionDilution,
}

impl FocusTheme {
    pub const ALL: [FocusTheme; 6] = [
        FocusTheme::UnrestrictedSubsidiaryLeakage,
        FocusTheme::AssetTransferLeakage,
        FocusTheme::DebtIncurrence,
        FocusTheme::CurePeriodAbuse,
        FocusTheme::ChangeOfControl,
        FocusTheme::EbitdaDefinitionDilution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FocusTheme::UnrestrictedSubsidiaryLeakage => "Unrestricted Subsidiary Leakage",
            FocusTheme::AssetTransferLeakage => "Asset Transfer Leakage",
            FocusTheme::DebtIncurrence => "Debt Incurrence",
            FocusTheme::CurePeriodAbuse => "Cure Period Abuse",
            FocusTheme::ChangeOfControl => "Change of Control",
            FocusTheme::EbitdaDefinitionDilution => "EBITDA Definition Dilution",
        }
    }
}
