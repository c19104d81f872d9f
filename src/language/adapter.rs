//! Maps an abstract stage to the concrete command for a profile

use std::fmt;
use std::time::Duration;

use super::plan::{CommandTemplate, StagePlan};
use super::profile::LanguageProfile;

/// Timeout for fetching the mutation results summary
const MUTATION_SUMMARY_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for a browser-automation run
const BROWSER_TESTS_TIMEOUT: Duration = Duration::from_secs(120);

/// Stages that run an external tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Compile tests (Java) or collect them without running (Python)
    Compile,
    /// Run the full test suite
    Test,
    /// Run mutation testing
    MutationAnalysis,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Compile => "compile",
            Stage::Test => "test",
            Stage::MutationAnalysis => "mutation-analysis",
        };
        f.write_str(name)
    }
}

/// Pure strategy table from (stage, profile) to command plan
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageAdapter;

impl LanguageAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn command_for(&self, stage: Stage, profile: LanguageProfile) -> StagePlan {
        match (profile, stage) {
            (LanguageProfile::Java, Stage::Compile) => StagePlan::Single(maven(&["test-compile"])),
            (LanguageProfile::Java, Stage::Test) => StagePlan::Single(maven(&["test"])),
            (LanguageProfile::Java, Stage::MutationAnalysis) => {
                StagePlan::Single(maven(&["test", "pitest:mutationCoverage"]))
            }
            (LanguageProfile::Python, Stage::Compile) => StagePlan::Single(pytest(&["--collect-only"])),
            (LanguageProfile::Python, Stage::Test) => StagePlan::Single(pytest(&[])),
            (LanguageProfile::Python, Stage::MutationAnalysis) => StagePlan::WithSummary {
                run: CommandTemplate::new(&["python", "-m", "mutmut", "run", "--no-progress"]),
                summary: CommandTemplate::new(&["python", "-m", "mutmut", "results"])
                    .with_timeout(MUTATION_SUMMARY_TIMEOUT),
            },
        }
    }

    /// Playwright run, independent of the target profile
    pub fn browser_tests(&self) -> CommandTemplate {
        CommandTemplate::new(&["npx", "playwright", "test", "--reporter=json"]).with_timeout(BROWSER_TESTS_TIMEOUT)
    }
}

fn maven(goals: &[&str]) -> CommandTemplate {
    let mut argv = vec!["mvn", "-B", "--fail-at-end"];
    argv.extend_from_slice(goals);
    CommandTemplate::new(argv.as_slice())
}

fn pytest(args: &[&str]) -> CommandTemplate {
    let mut argv = vec!["python", "-m", "pytest", "--tb=short", "-q"];
    argv.extend_from_slice(args);
    CommandTemplate::new(argv.as_slice())
}
