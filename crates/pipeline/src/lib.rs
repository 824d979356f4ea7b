//! Document analysis pipeline
//!
//! Two sequential reasoning stages over one document:
//!
//! ```text
//! document text ─► truncate ─► Extract ─► validate<Clause>
//!                                             │
//!                              DetectRisks ◄──┘
//!                                   │
//!                          validate<RiskRecord> ─► AnalysisOutput
//! ```
//!
//! The orchestrator holds no session state. Committing results, progress
//! ordering across runs and supersession belong to the session machine.

pub mod orchestrator;
pub mod validator;

pub use orchestrator::{progress, truncate_chars, AnalysisOutput, Orchestrator};
pub use validator::{validate, Shape};
