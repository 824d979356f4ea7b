//! Core traits for the deal simulator
//!
//! The reasoning backend sits behind a trait so the pipeline can be driven by
//! the Gemini client in production and by scripted mocks in tests.

mod reasoning;

pub use reasoning::{Credential, Operation, ReasoningRequest, ReasoningService};
