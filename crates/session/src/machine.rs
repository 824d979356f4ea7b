//! Session state machine
//!
//! Pure transition function over [`SessionState`]. Every run started by an
//! upload gets a fresh generation; run-scoped commands carrying any other
//! generation are rejected as stale. Reset also bumps the generation, so a
//! reset invalidates whatever was in flight.

use deal_sim_core::Document;
use deal_sim_pipeline::{progress, AnalysisOutput};

use crate::state::{AnalysisPhase, SessionState};

/// Identity of one analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunToken(u64);

impl RunToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Mutations accepted by the machine
#[derive(Debug, Clone)]
pub enum Command {
    /// Replace the document and start a new run
    Upload { document: Document },
    /// Progress report from a run
    Progress { token: RunToken, percent: u8 },
    /// Successful end of a run
    Complete {
        token: RunToken,
        output: AnalysisOutput,
    },
    /// Failed end of a run
    Fail { token: RunToken, message: String },
    /// Select a risk for display
    Select { risk_id: String },
    /// Toggle adversarial highlighting
    SetHighlight { enabled: bool },
    /// Clear everything and invalidate the current run
    Reset,
}

/// Why a command was not applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Interaction commands are refused while a run is in flight or failed
    NotInteractive(AnalysisPhase),
    /// Run-scoped command arrived when no run is active
    NotRunning(AnalysisPhase),
    /// The risk id is not in the current risk set
    UnknownRisk(String),
    /// Progress would move backwards
    ProgressRegression { current: u8, requested: u8 },
    /// The phase table does not allow this move
    IllegalTransition {
        from: AnalysisPhase,
        to: AnalysisPhase,
    },
}

/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored(IgnoreReason),
    /// The command belongs to a superseded run
    Stale,
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied)
    }
}

/// Owner of the session state
#[derive(Debug, Default)]
pub struct SessionMachine {
    state: SessionState,
    generation: u64,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> AnalysisPhase {
        self.state.phase
    }

    /// Token of the most recent run (or of the last reset)
    pub fn current_token(&self) -> RunToken {
        RunToken(self.generation)
    }

    /// Apply an upload and return the new run's token
    pub fn begin_run(&mut self, document: Document) -> RunToken {
        self.apply(Command::Upload { document });
        self.current_token()
    }

    pub fn apply(&mut self, command: Command) -> Transition {
        let transition = match command {
            Command::Upload { document } => self.upload(document),
            Command::Progress { token, percent } => self.progress(token, percent),
            Command::Complete { token, output } => self.complete(token, output),
            Command::Fail { token, message } => self.fail(token, message),
            Command::Select { risk_id } => self.select(risk_id),
            Command::SetHighlight { enabled } => self.set_highlight(enabled),
            Command::Reset => self.reset(),
        };

        match &transition {
            Transition::Applied => {}
            Transition::Ignored(reason) => {
                tracing::debug!(?reason, phase = %self.state.phase, "Session command ignored");
            }
            Transition::Stale => {
                tracing::debug!(generation = self.generation, "Stale run command discarded");
            }
        }
        transition
    }

    fn upload(&mut self, document: Document) -> Transition {
        self.clear_to_idle();
        self.generation += 1;

        self.state.document = Some(document);
        self.state.phase = AnalysisPhase::Extracting;
        self.state.progress = progress::UPLOADED;
        Transition::Applied
    }

    /// Stale or not running: the command must not touch the state
    fn check_run(&self, token: RunToken) -> Option<Transition> {
        if token.0 != self.generation {
            return Some(Transition::Stale);
        }
        if !self.state.phase.is_running() {
            return Some(Transition::Ignored(IgnoreReason::NotRunning(
                self.state.phase,
            )));
        }
        None
    }

    /// Phase moves must be in the phase table
    fn check_phase(&self, to: AnalysisPhase) -> Option<Transition> {
        let from = self.state.phase;
        if from.can_transition_to(to) {
            return None;
        }
        Some(Transition::Ignored(IgnoreReason::IllegalTransition { from, to }))
    }

    fn progress(&mut self, token: RunToken, percent: u8) -> Transition {
        if let Some(rejected) = self.check_run(token) {
            return rejected;
        }

        let percent = percent.min(progress::COMPLETE);
        if percent < self.state.progress {
            return Transition::Ignored(IgnoreReason::ProgressRegression {
                current: self.state.progress,
                requested: percent,
            });
        }

        if percent >= progress::DETECTION_DISPATCHED
            && self.state.phase == AnalysisPhase::Extracting
        {
            if let Some(rejected) = self.check_phase(AnalysisPhase::Detecting) {
                return rejected;
            }
            self.state.phase = AnalysisPhase::Detecting;
        }
        self.state.progress = percent;
        Transition::Applied
    }

    fn complete(&mut self, token: RunToken, output: AnalysisOutput) -> Transition {
        if let Some(rejected) = self
            .check_run(token)
            .or_else(|| self.check_phase(AnalysisPhase::Ready))
        {
            return rejected;
        }

        self.state.selected_risk_id = output.risks.first().map(|r| r.id.clone());
        self.state.clauses = output.clauses;
        self.state.risks = output.risks;
        self.state.phase = AnalysisPhase::Ready;
        self.state.progress = progress::COMPLETE;
        self.state.last_error = None;
        Transition::Applied
    }

    fn fail(&mut self, token: RunToken, message: String) -> Transition {
        if let Some(rejected) = self
            .check_run(token)
            .or_else(|| self.check_phase(AnalysisPhase::Failed))
        {
            return rejected;
        }

        self.state.clauses.clear();
        self.state.risks.clear();
        self.state.selected_risk_id = None;
        self.state.phase = AnalysisPhase::Failed;
        self.state.progress = 0;
        self.state.last_error = Some(message);
        Transition::Applied
    }

    fn select(&mut self, risk_id: String) -> Transition {
        if !self.state.phase.accepts_interaction() {
            return Transition::Ignored(IgnoreReason::NotInteractive(self.state.phase));
        }
        if !self.state.has_risk(&risk_id) {
            return Transition::Ignored(IgnoreReason::UnknownRisk(risk_id));
        }

        self.state.selected_risk_id = Some(risk_id);
        Transition::Applied
    }

    fn set_highlight(&mut self, enabled: bool) -> Transition {
        if !self.state.phase.accepts_interaction() {
            return Transition::Ignored(IgnoreReason::NotInteractive(self.state.phase));
        }

        self.state.highlight_mode_enabled = enabled;
        Transition::Applied
    }

    fn reset(&mut self) -> Transition {
        self.clear_to_idle();
        self.generation += 1;
        Transition::Applied
    }

    /// Highlight mode is a user preference and survives
    fn clear_to_idle(&mut self) {
        self.state = SessionState {
            highlight_mode_enabled: self.state.highlight_mode_enabled,
            ..SessionState::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deal_sim_core::{Clause, ImpactLevel, RiskRecord, Severity};

    fn risk(id: &str) -> RiskRecord {
        RiskRecord {
            id: id.to_string(),
            title: "Priming via non-pro-rata exchange".to_string(),
            category: "Debt Incurrence".to_string(),
            description: "Required Lenders can subordinate the minority".to_string(),
            severity: Severity::High,
            affected_clauses: vec!["9.02(b)".to_string()],
            rule_logic: "Sacred rights omit subordination".to_string(),
            rule_label: "SERTA-01".to_string(),
            evidence_snippet: "with the consent of the Required Lenders".to_string(),
            scenario_title: "The Uptier".to_string(),
            scenario_narrative: "Majority lenders exchange into a priming tranche".to_string(),
            scenario_impact: "Minority lenders primed".to_string(),
            recovery_risk: ImpactLevel::High,
            control_risk: ImpactLevel::High,
            timing_risk: ImpactLevel::Medium,
            adversarial_highlight: "Required Lenders".to_string(),
        }
    }

    fn clause(id: &str) -> Clause {
        Clause {
            id: id.to_string(),
            category: "Debt Incurrence".to_string(),
            section_reference: "9.02(b)".to_string(),
            text: "with the consent of the Required Lenders".to_string(),
            summary: "Majority amendment".to_string(),
        }
    }

    fn output(risk_ids: &[&str]) -> AnalysisOutput {
        AnalysisOutput {
            clauses: vec![clause("c1")],
            risks: risk_ids.iter().map(|id| risk(id)).collect(),
        }
    }

    fn doc(name: &str) -> Document {
        Document::new(name, "CREDIT AGREEMENT")
    }

    /// Detection dispatched, then results delivered
    fn finish(machine: &mut SessionMachine, token: RunToken, output: AnalysisOutput) -> Transition {
        machine.apply(Command::Progress { token, percent: 45 });
        machine.apply(Command::Complete { token, output })
    }

    #[test]
    fn test_upload_starts_run() {
        let mut machine = SessionMachine::new();
        let token = machine.begin_run(doc("a.txt"));

        let state = machine.state();
        assert_eq!(state.phase, AnalysisPhase::Extracting);
        assert_eq!(state.progress, 5);
        assert_eq!(state.document.as_ref().unwrap().name(), "a.txt");
        assert_eq!(token, machine.current_token());
    }

    #[test]
    fn test_progress_moves_to_detecting_and_never_decreases() {
        let mut machine = SessionMachine::new();
        let token = machine.begin_run(doc("a.txt"));

        assert!(machine.apply(Command::Progress { token, percent: 15 }).is_applied());
        assert_eq!(machine.phase(), AnalysisPhase::Extracting);

        assert!(machine.apply(Command::Progress { token, percent: 45 }).is_applied());
        assert_eq!(machine.phase(), AnalysisPhase::Detecting);

        assert_eq!(
            machine.apply(Command::Progress { token, percent: 15 }),
            Transition::Ignored(IgnoreReason::ProgressRegression {
                current: 45,
                requested: 15
            })
        );
        assert_eq!(machine.state().progress, 45);
    }

    #[test]
    fn test_complete_auto_selects_first_risk() {
        let mut machine = SessionMachine::new();
        let token = machine.begin_run(doc("a.txt"));

        let transition = finish(&mut machine, token, output(&["r1", "r2", "r3"]));
        assert!(transition.is_applied());

        let state = machine.state();
        assert_eq!(state.phase, AnalysisPhase::Ready);
        assert_eq!(state.progress, 100);
        assert_eq!(state.selected_risk_id.as_deref(), Some("r1"));
        assert_eq!(state.selected_risk().unwrap().id, "r1");
    }

    #[test]
    fn test_complete_before_detection_is_rejected() {
        let mut machine = SessionMachine::new();
        let token = machine.begin_run(doc("a.txt"));

        assert!(!AnalysisPhase::Extracting.can_transition_to(AnalysisPhase::Ready));
        assert_eq!(
            machine.apply(Command::Complete {
                token,
                output: output(&["r1"]),
            }),
            Transition::Ignored(IgnoreReason::IllegalTransition {
                from: AnalysisPhase::Extracting,
                to: AnalysisPhase::Ready
            })
        );

        let state = machine.state();
        assert_eq!(state.phase, AnalysisPhase::Extracting);
        assert_eq!(state.progress, 5);
        assert!(state.risks.is_empty());
        assert_eq!(state.selected_risk_id, None);

        assert!(finish(&mut machine, token, output(&["r1"])).is_applied());
        assert_eq!(machine.phase(), AnalysisPhase::Ready);
    }

    #[test]
    fn test_complete_with_no_risks_clears_selection() {
        let mut machine = SessionMachine::new();
        let token = machine.begin_run(doc("a.txt"));
        finish(&mut machine, token, output(&[]));

        let state = machine.state();
        assert_eq!(state.phase, AnalysisPhase::Ready);
        assert!(state.risks.is_empty());
        assert_eq!(state.selected_risk_id, None);
    }

    #[test]
    fn test_fail_clears_results_and_keeps_document() {
        let mut machine = SessionMachine::new();
        let token = machine.begin_run(doc("a.txt"));
        machine.apply(Command::Progress { token, percent: 45 });

        let transition = machine.apply(Command::Fail {
            token,
            message: "rate limited: quota".to_string(),
        });
        assert!(transition.is_applied());

        let state = machine.state();
        assert_eq!(state.phase, AnalysisPhase::Failed);
        assert_eq!(state.progress, 0);
        assert!(state.clauses.is_empty() && state.risks.is_empty());
        assert_eq!(state.last_error.as_deref(), Some("rate limited: quota"));
        assert!(state.document.is_some());
    }

    #[test]
    fn test_superseded_run_is_stale() {
        let mut machine = SessionMachine::new();
        let first = machine.begin_run(doc("a.txt"));
        let second = machine.begin_run(doc("b.txt"));
        assert_ne!(first, second);

        assert_eq!(
            machine.apply(Command::Complete {
                token: first,
                output: output(&["late"]),
            }),
            Transition::Stale
        );
        assert_eq!(
            machine.apply(Command::Progress {
                token: first,
                percent: 45
            }),
            Transition::Stale
        );
        assert_eq!(machine.phase(), AnalysisPhase::Extracting);
        assert_eq!(machine.state().progress, 5);

        finish(&mut machine, second, output(&["r1"]));
        let state = machine.state();
        assert_eq!(state.document.as_ref().unwrap().name(), "b.txt");
        assert_eq!(state.risks[0].id, "r1");
    }

    #[test]
    fn test_reset_invalidates_in_flight_run() {
        let mut machine = SessionMachine::new();
        let token = machine.begin_run(doc("a.txt"));

        assert!(machine.apply(Command::Reset).is_applied());
        assert_eq!(*machine.state(), SessionState::default());

        assert_eq!(
            machine.apply(Command::Complete {
                token,
                output: output(&["r1"]),
            }),
            Transition::Stale
        );
        assert_eq!(machine.phase(), AnalysisPhase::Idle);
    }

    #[test]
    fn test_reset_keeps_highlight_preference() {
        let mut machine = SessionMachine::new();
        assert!(machine.apply(Command::SetHighlight { enabled: false }).is_applied());
        machine.apply(Command::Reset);
        assert!(!machine.state().highlight_mode_enabled);
    }

    #[test]
    fn test_select_requires_known_risk_and_interactive_phase() {
        let mut machine = SessionMachine::new();
        let token = machine.begin_run(doc("a.txt"));

        assert_eq!(
            machine.apply(Command::Select {
                risk_id: "r2".to_string()
            }),
            Transition::Ignored(IgnoreReason::NotInteractive(AnalysisPhase::Extracting))
        );
        assert_eq!(
            machine.apply(Command::SetHighlight { enabled: false }),
            Transition::Ignored(IgnoreReason::NotInteractive(AnalysisPhase::Extracting))
        );
        assert!(machine.state().highlight_mode_enabled);

        finish(&mut machine, token, output(&["r1", "r2"]));
        assert!(machine
            .apply(Command::Select {
                risk_id: "r2".to_string()
            })
            .is_applied());
        assert_eq!(machine.state().selected_risk_id.as_deref(), Some("r2"));

        assert_eq!(
            machine.apply(Command::Select {
                risk_id: "r9".to_string()
            }),
            Transition::Ignored(IgnoreReason::UnknownRisk("r9".to_string()))
        );
        assert_eq!(machine.state().selected_risk_id.as_deref(), Some("r2"));
    }

    #[test]
    fn test_run_commands_after_completion_are_ignored() {
        let mut machine = SessionMachine::new();
        let token = machine.begin_run(doc("a.txt"));
        finish(&mut machine, token, output(&["r1"]));

        assert_eq!(
            machine.apply(Command::Fail {
                token,
                message: "late".to_string()
            }),
            Transition::Ignored(IgnoreReason::NotRunning(AnalysisPhase::Ready))
        );
        assert_eq!(machine.state().risks.len(), 1);
    }
}
