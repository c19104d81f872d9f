//! Iteration state and the events recorded at stage boundaries

use std::fmt;

use crate::process::ProcessResult;

/// Pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageName {
    Generate,
    Compile,
    Test,
    Mutate,
    Improve,
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageName::Generate => "generate",
            StageName::Compile => "compile",
            StageName::Test => "test",
            StageName::Mutate => "mutate",
            StageName::Improve => "improve",
        };
        f.write_str(name)
    }
}

/// Why an artifact was (re)generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationReason {
    /// First artifact, from specification and source
    Initial,
    /// Previous artifact failed to compile or collect
    CompileFailure,
    /// Previous artifact let mutants survive
    SurvivingMutants,
}

/// What a stage produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Process(ProcessResult),
    Generated { reason: GenerationReason, artifact: String },
}

/// One stage transition. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageEvent {
    pub stage: StageName,
    pub iteration: u32,
    pub outcome: StageOutcome,
}

impl StageEvent {
    pub fn process(stage: StageName, iteration: u32, result: ProcessResult) -> Self {
        Self {
            stage,
            iteration,
            outcome: StageOutcome::Process(result),
        }
    }

    pub fn generated(iteration: u32, reason: GenerationReason, artifact: impl Into<String>) -> Self {
        let stage = match reason {
            GenerationReason::Initial => StageName::Generate,
            GenerationReason::CompileFailure | GenerationReason::SurvivingMutants => StageName::Improve,
        };
        Self {
            stage,
            iteration,
            outcome: StageOutcome::Generated {
                reason,
                artifact: artifact.into(),
            },
        }
    }

    /// The process result, if this event ran a command
    pub fn process_result(&self) -> Option<&ProcessResult> {
        match &self.outcome {
            StageOutcome::Process(result) => Some(result),
            StageOutcome::Generated { .. } => None,
        }
    }
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    AllMutantsKilled,
    IterationBudgetExhausted,
    CompileFixesExhausted,
}

impl StopReason {
    /// Textual marker placed in the final report
    pub fn marker(&self) -> &'static str {
        match self {
            StopReason::AllMutantsKilled => "all mutants killed",
            StopReason::IterationBudgetExhausted => "iteration budget exhausted",
            StopReason::CompileFixesExhausted => "compile fixes exhausted",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// State of one orchestration run, owned by the engine for its duration
#[derive(Debug, Clone)]
pub struct IterationState {
    iteration: u32,
    current_artifact: String,
    history: Vec<StageEvent>,
}

impl IterationState {
    pub fn new(initial_artifact: impl Into<String>) -> Self {
        Self {
            iteration: 1,
            current_artifact: initial_artifact.into(),
            history: Vec::new(),
        }
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn current_artifact(&self) -> &str {
        &self.current_artifact
    }

    pub fn history(&self) -> &[StageEvent] {
        &self.history
    }

    pub fn record(&mut self, event: StageEvent) {
        self.history.push(event);
    }

    pub fn replace_artifact(&mut self, artifact: impl Into<String>) {
        self.current_artifact = artifact.into();
    }

    /// Move to the next outer iteration
    pub fn advance(&mut self) {
        self.iteration += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_starts_at_iteration_one() {
        let state = IterationState::new("tests");
        assert_eq!(state.iteration(), 1);
        assert_eq!(state.current_artifact(), "tests");
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_state_advance_and_replace() {
        let mut state = IterationState::new("v1");
        state.replace_artifact("v2");
        state.advance();
        assert_eq!(state.iteration(), 2);
        assert_eq!(state.current_artifact(), "v2");
    }

    #[test]
    fn test_state_history_is_ordered() {
        let mut state = IterationState::new("");
        state.record(StageEvent::generated(1, GenerationReason::Initial, "a"));
        state.record(StageEvent::process(StageName::Compile, 1, ProcessResult::completed(0, "", "")));
        state.record(StageEvent::process(StageName::Compile, 1, ProcessResult::completed(1, "", "e")));

        let stages: Vec<StageName> = state.history().iter().map(|e| e.stage).collect();
        assert_eq!(stages, vec![StageName::Generate, StageName::Compile, StageName::Compile]);
        assert_eq!(state.history()[2].process_result().map(|r| r.exit_code), Some(1));
    }

    #[test]
    fn test_generated_event_stage_follows_reason() {
        assert_eq!(
            StageEvent::generated(1, GenerationReason::Initial, "").stage,
            StageName::Generate
        );
        assert_eq!(
            StageEvent::generated(1, GenerationReason::CompileFailure, "").stage,
            StageName::Improve
        );
        assert_eq!(
            StageEvent::generated(2, GenerationReason::SurvivingMutants, "").stage,
            StageName::Improve
        );
    }

    #[test]
    fn test_process_result_accessor() {
        let event = StageEvent::process(StageName::Test, 1, ProcessResult::completed(0, "ok", ""));
        assert_eq!(event.process_result().unwrap().stdout, "ok");
        let event = StageEvent::generated(1, GenerationReason::Initial, "x");
        assert!(event.process_result().is_none());
    }

    #[test]
    fn test_stop_reason_markers() {
        assert_eq!(StopReason::AllMutantsKilled.marker(), "all mutants killed");
        assert_eq!(StopReason::IterationBudgetExhausted.to_string(), "iteration budget exhausted");
        assert_eq!(StopReason::CompileFixesExhausted.marker(), "compile fixes exhausted");
    }

    #[test]
    fn test_stage_name_display() {
        assert_eq!(StageName::Mutate.to_string(), "mutate");
        assert_eq!(StageName::Improve.to_string(), "improve");
    }
}
