//! Append-only trace of a run, rendered as Markdown
//!
//! Sections are rendered as events arrive, so a partial trace is always
//! available even when a run stops early.

use chrono::{DateTime, Local};

use crate::classify::ResultClassifier;
use crate::engine::{GenerationReason, StageEvent, StageName, StageOutcome, StopReason};
use crate::language::LanguageProfile;
use crate::process::ProcessResult;
use crate::prompt::tail_chars;

/// Output shown for compile failures and mutation runs
const REPORT_OUTPUT_TAIL_CHARS: usize = 2000;

pub struct ReportAccumulator {
    profile: LanguageProfile,
    sections: Vec<String>,
    current_iteration: u32,
}

impl ReportAccumulator {
    pub fn new(profile: LanguageProfile, model: &str) -> Self {
        Self::started_at(profile, model, Local::now())
    }

    pub fn started_at(profile: LanguageProfile, model: &str, started: DateTime<Local>) -> Self {
        let header = format!(
            "# Test Cycle Report\n\n- Profile: {}\n- Model: {}\n- Started: {}\n",
            profile,
            model,
            started.format("%Y-%m-%d %H:%M:%S")
        );
        Self {
            profile,
            sections: vec![header],
            current_iteration: 0,
        }
    }

    /// Open the `## Iteration N` section. Everything recorded or noted
    /// afterwards belongs to it; repeated calls for the same N are no-ops.
    pub fn begin_iteration(&mut self, iteration: u32) {
        if iteration != self.current_iteration {
            self.current_iteration = iteration;
            self.sections.push(format!("## Iteration {}\n", iteration));
        }
    }

    /// Append the rendered section for an event
    pub fn record(&mut self, event: &StageEvent) {
        let section = match &event.outcome {
            StageOutcome::Process(result) => render_process(event.stage, result),
            StageOutcome::Generated { reason, artifact } => self.render_generated(*reason, artifact),
        };
        self.sections.push(section);
    }

    /// Append free text that is not a stage transition
    pub fn note(&mut self, text: impl AsRef<str>) {
        self.sections.push(format!("> {}\n", text.as_ref()));
    }

    /// The trace so far
    pub fn render(&self) -> String {
        self.sections.join("\n")
    }

    /// Close the trace with the stop marker and render it
    pub fn finish(mut self, stop: StopReason, iterations: u32) -> String {
        let plural = if iterations == 1 { "" } else { "s" };
        self.sections.push(format!(
            "## Outcome\n\nStopped after {} iteration{}: {}\n",
            iterations, plural, stop
        ));
        self.render()
    }

    fn render_generated(&self, reason: GenerationReason, artifact: &str) -> String {
        let heading = match reason {
            GenerationReason::Initial => "## Initial generation",
            GenerationReason::CompileFailure => "### Compile fix",
            GenerationReason::SurvivingMutants => "### Improved tests",
        };
        if artifact.trim().is_empty() {
            return format!("{}\n\n_(generation returned no text)_\n", heading);
        }
        format!("{}\n\n```{}\n{}\n```\n", heading, self.profile, artifact.trim_end())
    }
}

fn render_process(stage: StageName, result: &ProcessResult) -> String {
    let title = match stage {
        StageName::Compile => "Compile",
        StageName::Test => "Tests",
        StageName::Mutate => "Mutation analysis",
        StageName::Generate | StageName::Improve => "Command",
    };

    if result.timed_out {
        return format!("### {}: timed out\n", title);
    }

    match stage {
        StageName::Compile if result.exit_code == 0 => format!("### {}: ok\n", title),
        StageName::Compile => format!(
            "### {}: failed (exit {})\n```\n{}\n```\n",
            title,
            result.exit_code,
            tail_chars(&result.stderr, REPORT_OUTPUT_TAIL_CHARS).trim_end()
        ),
        StageName::Mutate => format!(
            "### {}: {} (exit {})\n```\n{}\n```\n",
            title,
            ResultClassifier::new().classify(&result.stdout).label(),
            result.exit_code,
            tail_chars(&result.stdout, REPORT_OUTPUT_TAIL_CHARS).trim_end()
        ),
        _ => format!("### {}: exit={}\n", title, result.exit_code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ReportAccumulator {
        ReportAccumulator::new(LanguageProfile::Java, "mock-model")
    }

    #[test]
    fn test_header() {
        let text = report().render();
        assert!(text.starts_with("# Test Cycle Report"));
        assert!(text.contains("- Profile: java"));
        assert!(text.contains("- Model: mock-model"));
    }

    #[test]
    fn test_initial_generation_has_no_iteration_header() {
        let mut report = report();
        report.record(&StageEvent::generated(1, GenerationReason::Initial, "class T {}"));
        let text = report.render();
        assert!(text.contains("## Initial generation\n\n```java\nclass T {}\n```"));
        assert!(!text.contains("## Iteration"));
    }

    #[test]
    fn test_iteration_header_once_per_iteration() {
        let mut report = report();
        report.begin_iteration(1);
        report.record(&StageEvent::process(StageName::Compile, 1, ProcessResult::completed(0, "", "")));
        report.begin_iteration(1);
        report.record(&StageEvent::process(StageName::Test, 1, ProcessResult::completed(0, "", "")));
        report.begin_iteration(2);
        report.record(&StageEvent::process(StageName::Compile, 2, ProcessResult::completed(0, "", "")));

        let text = report.render();
        assert_eq!(text.matches("## Iteration 1").count(), 1);
        assert_eq!(text.matches("## Iteration 2").count(), 1);
        assert!(text.find("## Iteration 2").unwrap() < text.rfind("### Compile: ok").unwrap());
    }

    #[test]
    fn test_note_after_begin_lands_in_new_iteration() {
        let mut report = report();
        report.begin_iteration(1);
        report.record(&StageEvent::generated(1, GenerationReason::SurvivingMutants, "v2"));
        report.begin_iteration(2);
        report.note("Failed to write tests to MoneyTest.java: read-only");

        let text = report.render();
        let second = text.find("## Iteration 2").unwrap();
        let note = text.find("> Failed to write tests").unwrap();
        assert!(second < note);
    }

    #[test]
    fn test_compile_failure_shows_stderr() {
        let mut report = report();
        report.record(&StageEvent::process(
            StageName::Compile,
            1,
            ProcessResult::completed(1, "", "syntax error"),
        ));
        let text = report.render();
        assert!(text.contains("### Compile: failed (exit 1)"));
        assert!(text.contains("syntax error"));
    }

    #[test]
    fn test_mutation_section_has_verdict() {
        let mut report = report();
        report.record(&StageEvent::process(
            StageName::Mutate,
            1,
            ProcessResult::completed(0, "2 survived, 0 killed", ""),
        ));
        let text = report.render();
        assert!(text.contains("### Mutation analysis: survivors present (exit 0)"));
        assert!(text.contains("2 survived, 0 killed"));
    }

    #[test]
    fn test_timed_out_stage() {
        let mut report = report();
        report.record(&StageEvent::process(StageName::Test, 1, ProcessResult::timed_out()));
        assert!(report.render().contains("### Tests: timed out"));
    }

    #[test]
    fn test_empty_generation_is_visible() {
        let mut report = report();
        report.record(&StageEvent::generated(1, GenerationReason::SurvivingMutants, "  "));
        assert!(report.render().contains("### Improved tests\n\n_(generation returned no text)_"));
    }

    #[test]
    fn test_note() {
        let mut report = report();
        report.note("Failed to write tests: permission denied");
        assert!(report.render().contains("> Failed to write tests: permission denied"));
    }

    #[test]
    fn test_finish_appends_outcome() {
        let mut report = report();
        report.record(&StageEvent::generated(1, GenerationReason::Initial, "x"));
        let text = report.finish(StopReason::IterationBudgetExhausted, 1);
        assert!(text.ends_with("## Outcome\n\nStopped after 1 iteration: iteration budget exhausted\n"));
    }

    #[test]
    fn test_finish_plural() {
        let text = report().finish(StopReason::AllMutantsKilled, 2);
        assert!(text.contains("Stopped after 2 iterations: all mutants killed"));
    }
}
