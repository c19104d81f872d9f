//! Concrete commands for a stage and how to run them

use std::path::Path;
use std::time::Duration;

use log::debug;

use crate::process::{CommandRunner, ProcessResult};

/// Inserted between run output and summary output of a composite stage
pub const RESULTS_SEPARATOR: &str = "\n\n--- RESULTS ---\n";

/// One command line, optionally with a tighter timeout than the stage's
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    pub argv: Vec<String>,
    pub timeout: Option<Duration>,
}

impl CommandTemplate {
    pub fn new<S: AsRef<str>>(parts: &[S]) -> Self {
        Self {
            argv: parts.iter().map(|p| p.as_ref().to_string()).collect(),
            timeout: None,
        }
    }

    /// Cap this command's timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Timeout to apply under a stage budget
    pub fn effective_timeout(&self, stage_timeout: Duration) -> Duration {
        self.timeout.map_or(stage_timeout, |t| t.min(stage_timeout))
    }

    pub fn display(&self) -> String {
        self.argv.join(" ")
    }
}

/// What a stage runs: one command, or a run followed by a summary fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagePlan {
    Single(CommandTemplate),
    WithSummary {
        run: CommandTemplate,
        summary: CommandTemplate,
    },
}

impl StagePlan {
    pub fn is_composite(&self) -> bool {
        matches!(self, StagePlan::WithSummary { .. })
    }

    /// Commands in execution order
    pub fn commands(&self) -> Vec<&CommandTemplate> {
        match self {
            StagePlan::Single(cmd) => vec![cmd],
            StagePlan::WithSummary { run, summary } => vec![run, summary],
        }
    }

    /// Run the plan and fold it into one result.
    ///
    /// For a composite plan the summary is only fetched when the run step
    /// actually ran; its stdout is appended after `RESULTS_SEPARATOR` while
    /// exit code and stderr come from the run step.
    pub async fn execute<R>(&self, runner: &R, working_dir: &Path, stage_timeout: Duration) -> ProcessResult
    where
        R: CommandRunner + ?Sized,
    {
        match self {
            StagePlan::Single(cmd) => {
                runner
                    .execute(&cmd.argv, working_dir, cmd.effective_timeout(stage_timeout))
                    .await
            }
            StagePlan::WithSummary { run, summary } => {
                let result = runner
                    .execute(&run.argv, working_dir, run.effective_timeout(stage_timeout))
                    .await;
                if !result.ran() {
                    debug!("skipping summary, '{}' did not run", run.display());
                    return result;
                }

                let details = runner
                    .execute(&summary.argv, working_dir, summary.effective_timeout(stage_timeout))
                    .await;
                ProcessResult::completed(
                    result.exit_code,
                    format!("{}{}{}", result.stdout, RESULTS_SEPARATOR, details.stdout),
                    result.stderr,
                )
            }
        }
    }
}
