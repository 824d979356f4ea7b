//! Core traits and types for the adversarial deal simulator
//!
//! This crate provides foundational types used across all other crates:
//! - Document, clause and risk record types
//! - Error taxonomy (configuration, service, schema)
//! - Record shape descriptors shared by the validator and the service client
//! - Evidence highlight resolution
//! - The `ReasoningService` trait for pluggable reasoning backends
//! - The adversarial pattern catalogue

pub mod clause;
pub mod document;
pub mod error;
pub mod highlight;
pub mod patterns;
pub mod risk;
pub mod shape;
pub mod traits;

pub use clause::{Clause, ClauseCategory};
pub use document::Document;
pub use error::{Error, Result, SchemaError, ServiceError, ServiceErrorKind};
pub use highlight::{render_evidence, resolve, Segment};
pub use patterns::{AdversarialPattern, FocusTheme, ADVERSARIAL_PATTERNS, SYSTEM_LIMITATIONS};
pub use risk::{DealRiskRating, ImpactLevel, RiskRecord, Severity};
pub use shape::{FieldKind, FieldSpec, CLAUSE_FIELDS, RISK_FIELDS};
pub use traits::{Credential, Operation, ReasoningRequest, ReasoningService};
