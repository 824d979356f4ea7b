//! Session analyzer
//!
//! Glue between the session machine and the pipeline: starts runs, feeds
//! pipeline progress into the machine under the run's token and commits the
//! outcome. Consumers observe the session through snapshots or the event
//! channel.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::broadcast;

use deal_sim_config::{AnalysisConfig, ConfigResolver, OverridesView, UserOverrides};
use deal_sim_core::{render_evidence, Clause, Document, Error, Result, RiskRecord, Segment};
use deal_sim_pipeline::Orchestrator;

use crate::machine::{Command, RunToken, SessionMachine, Transition};
use crate::state::{AnalysisPhase, SessionSnapshot};

/// Session events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new document was accepted and its run started
    RunStarted {
        generation: u64,
        document_name: String,
    },
    /// Phase changed
    PhaseChanged {
        old: AnalysisPhase,
        new: AnalysisPhase,
    },
    /// Progress of the current run
    Progress { generation: u64, percent: u8 },
    /// Results committed
    Committed {
        generation: u64,
        clauses: usize,
        risks: usize,
    },
    /// The current run failed
    Failed {
        generation: u64,
        code: &'static str,
        message: String,
    },
    /// A superseded run finished and its result was dropped
    RunDiscarded { generation: u64 },
    /// Selected risk changed
    SelectionChanged { risk_id: Option<String> },
    /// Highlight mode toggled
    HighlightModeChanged { enabled: bool },
    /// Session cleared
    Reset,
}

/// How a run ended from the session's point of view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Results are now the session's state
    Committed {
        clauses: Vec<Clause>,
        risks: Vec<RiskRecord>,
    },
    /// A newer upload or a reset took over; nothing was committed
    Superseded,
}

/// Evidence of the selected risk, read under one lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidenceView {
    pub risk_id: String,
    pub section_reference: Option<String>,
    /// Recovery, control and timing meter fill levels
    pub impact_bars: [u8; 3],
    pub highlight_mode_enabled: bool,
    pub segments: Vec<Segment>,
}

/// One analysis session
pub struct SessionAnalyzer {
    machine: Arc<Mutex<SessionMachine>>,
    orchestrator: Arc<Orchestrator>,
    resolver: ConfigResolver,
    overrides: RwLock<UserOverrides>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionAnalyzer {
    pub fn new(orchestrator: Arc<Orchestrator>, resolver: ConfigResolver) -> Self {
        let (event_tx, _) = broadcast::channel(100);

        Self {
            machine: Arc::new(Mutex::new(SessionMachine::new())),
            orchestrator,
            resolver,
            overrides: RwLock::new(UserOverrides::default()),
            event_tx,
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Upload, resolve, run and commit in one call
    pub async fn analyze(&self, document: Document) -> Result<RunOutcome> {
        let text = document.content().to_string();
        let token = self.begin_run(document);
        self.drive(token, &text).await
    }

    /// Accept a document and start a run, superseding any run in flight
    ///
    /// The returned token must be passed to [`drive`](Self::drive) together
    /// with the document text.
    pub fn begin_run(&self, document: Document) -> RunToken {
        let document_name = document.name().to_string();
        let chars = document.char_len();

        let (token, old_phase) = {
            let mut machine = self.machine.lock();
            let old_phase = machine.phase();
            (machine.begin_run(document), old_phase)
        };

        tracing::info!(
            generation = token.generation(),
            document = %document_name,
            chars,
            "Analysis run started"
        );
        let _ = self.event_tx.send(SessionEvent::RunStarted {
            generation: token.generation(),
            document_name,
        });
        self.emit_phase_change(old_phase, AnalysisPhase::Extracting);
        token
    }

    /// Run the pipeline for a started run and commit its outcome
    ///
    /// Errors are returned after the session has moved to `Failed`. A run
    /// that was superseded meanwhile resolves to [`RunOutcome::Superseded`],
    /// whatever the pipeline returned.
    pub async fn drive(&self, token: RunToken, document_text: &str) -> Result<RunOutcome> {
        let config = match self.resolve_config() {
            Ok(config) => config,
            Err(err) => return self.commit_failure(token, err),
        };

        let result = self
            .orchestrator
            .run(document_text, &config, |percent| self.record_progress(token, percent))
            .await;

        match result {
            Ok(output) => {
                let committed = output.clone();
                match self.apply(Command::Complete { token, output }) {
                    Transition::Applied => {
                        tracing::info!(
                            generation = token.generation(),
                            clauses = committed.clauses.len(),
                            risks = committed.risks.len(),
                            "Analysis committed"
                        );
                        let _ = self.event_tx.send(SessionEvent::Committed {
                            generation: token.generation(),
                            clauses: committed.clauses.len(),
                            risks: committed.risks.len(),
                        });
                        let _ = self.event_tx.send(SessionEvent::SelectionChanged {
                            risk_id: committed.risks.first().map(|r| r.id.clone()),
                        });
                        Ok(RunOutcome::Committed {
                            clauses: committed.clauses,
                            risks: committed.risks,
                        })
                    }
                    _ => Ok(self.discard(token)),
                }
            }
            Err(err) => self.commit_failure(token, err),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.machine.lock().state().snapshot()
    }

    pub fn phase(&self) -> AnalysisPhase {
        self.machine.lock().phase()
    }

    pub fn clauses(&self) -> Vec<Clause> {
        self.machine.lock().state().clauses.clone()
    }

    pub fn risks(&self) -> Vec<RiskRecord> {
        self.machine.lock().state().risks.clone()
    }

    pub fn selected_risk(&self) -> Option<RiskRecord> {
        self.machine.lock().state().selected_risk().cloned()
    }

    /// Evidence segments of the selected risk under the current highlight mode
    pub fn evidence(&self) -> Option<EvidenceView> {
        let machine = self.machine.lock();
        let state = machine.state();
        state.selected_risk().map(|risk| EvidenceView {
            risk_id: risk.id.clone(),
            section_reference: risk.section_reference().map(str::to_string),
            impact_bars: [
                risk.recovery_risk.bars(),
                risk.control_risk.bars(),
                risk.timing_risk.bars(),
            ],
            highlight_mode_enabled: state.highlight_mode_enabled,
            segments: render_evidence(risk, state.highlight_mode_enabled),
        })
    }

    pub fn select(&self, risk_id: impl Into<String>) -> Transition {
        let risk_id = risk_id.into();
        let transition = self.apply(Command::Select {
            risk_id: risk_id.clone(),
        });
        if transition.is_applied() {
            let _ = self.event_tx.send(SessionEvent::SelectionChanged {
                risk_id: Some(risk_id),
            });
        }
        transition
    }

    pub fn set_highlight(&self, enabled: bool) -> Transition {
        let transition = self.apply(Command::SetHighlight { enabled });
        if transition.is_applied() {
            let _ = self.event_tx.send(SessionEvent::HighlightModeChanged { enabled });
        }
        transition
    }

    /// Clear the session; any run in flight becomes stale
    pub fn reset(&self) {
        self.apply(Command::Reset);
        tracing::info!("Session reset");
        let _ = self.event_tx.send(SessionEvent::Reset);
    }

    /// Overrides as they may be shown to the user
    pub fn overrides(&self) -> OverridesView {
        self.overrides.read().view()
    }

    /// Edit the overrides; takes effect from the next run
    pub fn update_overrides<F>(&self, update: F) -> OverridesView
    where
        F: FnOnce(&mut UserOverrides),
    {
        let view = {
            let mut overrides = self.overrides.write();
            update(&mut overrides);
            overrides.view()
        };
        tracing::info!(
            credential_set = view.credential_set,
            extraction_model = ?view.extraction_model,
            reasoning_model = ?view.reasoning_model,
            "User overrides updated"
        );
        view
    }

    /// Whether runs can proceed without a user credential
    pub fn has_default_credential(&self) -> bool {
        self.resolver.has_default_credential()
    }

    fn resolve_config(&self) -> Result<AnalysisConfig> {
        let overrides = self.overrides.read().clone();
        Ok(self.resolver.resolve(&overrides)?)
    }

    fn record_progress(&self, token: RunToken, percent: u8) {
        if self.apply(Command::Progress { token, percent }).is_applied() {
            let _ = self.event_tx.send(SessionEvent::Progress {
                generation: token.generation(),
                percent,
            });
        }
    }

    fn commit_failure(&self, token: RunToken, err: Error) -> Result<RunOutcome> {
        let transition = self.apply(Command::Fail {
            token,
            message: err.to_string(),
        });
        if !transition.is_applied() {
            return Ok(self.discard(token));
        }

        tracing::warn!(
            generation = token.generation(),
            code = err.code(),
            error = %err,
            "Analysis run failed"
        );
        let _ = self.event_tx.send(SessionEvent::Failed {
            generation: token.generation(),
            code: err.code(),
            message: err.to_string(),
        });
        Err(err)
    }

    fn discard(&self, token: RunToken) -> RunOutcome {
        tracing::debug!(generation = token.generation(), "Superseded run result discarded");
        let _ = self.event_tx.send(SessionEvent::RunDiscarded {
            generation: token.generation(),
        });
        RunOutcome::Superseded
    }

    /// Apply one command under the lock and announce any phase change
    fn apply(&self, command: Command) -> Transition {
        let (transition, old_phase, new_phase) = {
            let mut machine = self.machine.lock();
            let old_phase = machine.phase();
            let transition = machine.apply(command);
            (transition, old_phase, machine.phase())
        };
        self.emit_phase_change(old_phase, new_phase);
        transition
    }

    fn emit_phase_change(&self, old: AnalysisPhase, new: AnalysisPhase) {
        if old != new {
            tracing::debug!(%old, %new, "Session phase changed");
            let _ = self.event_tx.send(SessionEvent::PhaseChanged { old, new });
        }
    }
}
