//! Analysis session
//!
//! One session holds at most one document and the results of its latest
//! analysis run. All mutations go through [`SessionMachine::apply`], and runs
//! are identified by a [`RunToken`] so that a late result from a superseded
//! run can never overwrite the state of a newer one.
//!
//! ```text
//!  Idle ──upload──► Extracting ──progress ≥ 45──► Detecting ──complete──► Ready
//!   ▲                   │                            │                     │
//!   │                   └──────────fail──────────────┴───► Failed          │
//!   └──────────────────────────── reset / upload ◄────────────┴────────────┘
//! ```

pub mod analyzer;
pub mod machine;
pub mod state;

pub use analyzer::{EvidenceView, RunOutcome, SessionAnalyzer, SessionEvent};
pub use machine::{Command, IgnoreReason, RunToken, SessionMachine, Transition};
pub use state::{AnalysisPhase, SessionSnapshot, SessionState};
