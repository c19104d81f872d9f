//! IterationEngine - drives one test generation cycle to a stop marker.
//!
//! Each outer iteration compiles the current artifact (asking for fixes while
//! compilation fails, up to `max_compile_fixes`), runs the tests, runs
//! mutation analysis and then either stops or asks for an improved artifact.
//! Operational failures never abort the run; they end up in the report.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};

use super::config::OrchestrationConfig;
use super::state::{GenerationReason, IterationState, StageEvent, StageName, StopReason};
use crate::classify::{MutationVerdict, ResultClassifier};
use crate::error::Result;
use crate::generation::{GenerationGateway, RoleTemplate};
use crate::language::{LanguageAdapter, LanguageProfile, Stage};
use crate::process::{CommandRunner, ProcessResult};
use crate::prompt::PromptRenderer;
use crate::report::ReportAccumulator;

/// Inputs for one full cycle
#[derive(Debug, Clone)]
pub struct CycleRequest {
    /// Behaviour the tests should pin down
    pub spec: String,
    /// Production code under test
    pub source_code: String,
    /// Directory the build, test and mutation tools run in
    pub project_dir: PathBuf,
    pub profile: LanguageProfile,
    /// Where the current artifact is written before each compile.
    /// Relative paths are resolved against `project_dir`.
    pub test_file: Option<PathBuf>,
}

impl CycleRequest {
    pub fn new(
        spec: impl Into<String>,
        source_code: impl Into<String>,
        project_dir: impl Into<PathBuf>,
        profile: LanguageProfile,
    ) -> Self {
        Self {
            spec: spec.into(),
            source_code: source_code.into(),
            project_dir: project_dir.into(),
            profile,
            test_file: None,
        }
    }

    pub fn with_test_file(mut self, test_file: impl Into<PathBuf>) -> Self {
        self.test_file = Some(test_file.into());
        self
    }

    fn resolved_test_file(&self) -> Option<PathBuf> {
        self.test_file.as_ref().map(|path| {
            if path.is_absolute() {
                path.clone()
            } else {
                self.project_dir.join(path)
            }
        })
    }
}

/// Orchestrates the cycle. Collaborators are injected at construction and
/// shared read-only, so independent runs may use one engine concurrently.
pub struct IterationEngine<R, G>
where
    R: CommandRunner,
    G: GenerationGateway,
{
    runner: Arc<R>,
    gateway: Arc<G>,
    adapter: LanguageAdapter,
    classifier: ResultClassifier,
    renderer: PromptRenderer,
    config: OrchestrationConfig,
}

impl<R, G> IterationEngine<R, G>
where
    R: CommandRunner,
    G: GenerationGateway,
{
    pub fn new(runner: Arc<R>, gateway: Arc<G>, config: OrchestrationConfig) -> Self {
        Self {
            runner,
            gateway,
            adapter: LanguageAdapter::new(),
            classifier: ResultClassifier::new(),
            renderer: PromptRenderer::new(),
            config,
        }
    }

    pub fn config(&self) -> &OrchestrationConfig {
        &self.config
    }

    /// Run the cycle and return the rendered trace.
    ///
    /// The trace always ends with an `## Outcome` line carrying one of the
    /// `StopReason` markers; callers inspect that text to learn the result.
    ///
    /// Survivors on the last iteration still get an improvement request. That
    /// artifact is reported as the final `### Improved tests` block and
    /// written nowhere: it is never compiled, tested or mutation-checked.
    // TODO: thread a cancellation token through the stage calls so a whole run can be aborted
    pub async fn run(&self, request: &CycleRequest) -> String {
        info!(
            "Starting test cycle: profile={}, max_iterations={}, project_dir={}",
            request.profile,
            self.config.max_iterations,
            request.project_dir.display()
        );
        let mut report = ReportAccumulator::new(request.profile, self.gateway.model());

        let context = self
            .renderer
            .tdd_context(&request.spec, &request.source_code, request.profile);
        let initial = self.generate(RoleTemplate::TddTests, context, &mut report).await;
        let mut state = IterationState::new(initial.clone());
        push(&mut state, &mut report, StageEvent::generated(1, GenerationReason::Initial, initial));

        let stop = loop {
            let iteration = state.iteration();
            info!("Iteration {}/{}", iteration, self.config.max_iterations);
            report.begin_iteration(iteration);

            if !self.compile_with_fixes(request, &mut state, &mut report).await {
                break StopReason::CompileFixesExhausted;
            }

            let tests = self.run_stage(Stage::Test, request).await;
            info!("Tests finished: exit={}, timed_out={}", tests.exit_code, tests.timed_out);
            push(&mut state, &mut report, StageEvent::process(StageName::Test, iteration, tests));

            let mutation = self.run_stage(Stage::MutationAnalysis, request).await;
            let verdict = self.classifier.classify(&mutation.stdout);
            info!("Mutation analysis finished: {}", verdict.label());
            let output = mutation.stdout.clone();
            push(
                &mut state,
                &mut report,
                StageEvent::process(StageName::Mutate, iteration, mutation),
            );

            if verdict == MutationVerdict::FullyKilled {
                break StopReason::AllMutantsKilled;
            }

            let context = self
                .renderer
                .kill_survivors_context(state.current_artifact(), &output);
            let improved = self
                .generate(RoleTemplate::MutationImprovement, context, &mut report)
                .await;
            state.replace_artifact(improved.clone());
            push(
                &mut state,
                &mut report,
                StageEvent::generated(iteration, GenerationReason::SurvivingMutants, improved),
            );

            if iteration >= self.config.max_iterations {
                break StopReason::IterationBudgetExhausted;
            }
            state.advance();
        };

        info!(
            "Test cycle stopped after {} iteration(s), {} stage events: {}",
            state.iteration(),
            state.history().len(),
            stop
        );
        report.finish(stop, state.iteration())
    }

    /// Compile, asking for a fix after each failure. Returns false once
    /// `max_compile_fixes` fixes have been spent without a clean compile.
    async fn compile_with_fixes(
        &self,
        request: &CycleRequest,
        state: &mut IterationState,
        report: &mut ReportAccumulator,
    ) -> bool {
        let iteration = state.iteration();
        let mut fixes = 0;

        loop {
            self.materialize(request, state.current_artifact(), report).await;

            let result = self.run_stage(Stage::Compile, request).await;
            let compiled = result.exit_code == 0;
            let stderr = result.stderr.clone();
            push(state, report, StageEvent::process(StageName::Compile, iteration, result));

            if compiled {
                info!("Compile ok");
                return true;
            }
            if fixes >= self.config.max_compile_fixes {
                warn!(
                    "Compile still failing after {} fix(es), giving up",
                    self.config.max_compile_fixes
                );
                return false;
            }

            fixes += 1;
            info!("Compile failed, requesting fix {}/{}", fixes, self.config.max_compile_fixes);
            let context = self
                .renderer
                .compile_fix_context(state.current_artifact(), &stderr);
            let fixed = self.generate(RoleTemplate::TddTests, context, report).await;
            state.replace_artifact(fixed.clone());
            push(
                state,
                report,
                StageEvent::generated(iteration, GenerationReason::CompileFailure, fixed),
            );
        }
    }

    async fn run_stage(&self, stage: Stage, request: &CycleRequest) -> ProcessResult {
        let plan = self.adapter.command_for(stage, request.profile);
        debug!("Running {} stage in {}", stage, request.project_dir.display());
        plan.execute(self.runner.as_ref(), &request.project_dir, self.config.stage_timeout)
            .await
    }

    /// Call the gateway; any failure degrades to an empty artifact
    async fn generate(&self, role: RoleTemplate, context: Result<String>, report: &mut ReportAccumulator) -> String {
        let context = match context {
            Ok(context) => context,
            Err(e) => {
                warn!("Could not build {} context: {}", role, e);
                report.note(format!("Could not build {} context: {}", role, e));
                return String::new();
            }
        };

        match self.gateway.generate(role, &context).await {
            Ok(text) => {
                if text.trim().is_empty() {
                    warn!("Generation for {} returned no text", role);
                }
                text
            }
            Err(e) => {
                warn!("Generation for {} failed: {}", role, e);
                report.note(format!("Generation for {} failed: {}", role, e));
                String::new()
            }
        }
    }

    async fn materialize(&self, request: &CycleRequest, artifact: &str, report: &mut ReportAccumulator) {
        let Some(path) = request.resolved_test_file() else {
            return;
        };
        if let Err(e) = write_artifact(&path, artifact).await {
            warn!("Failed to write tests to {}: {}", path.display(), e);
            report.note(format!("Failed to write tests to {}: {}", path.display(), e));
        } else {
            debug!("Wrote {} bytes to {}", artifact.len(), path.display());
        }
    }
}

async fn write_artifact(path: &Path, artifact: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, artifact).await
}

fn push(state: &mut IterationState, report: &mut ReportAccumulator, event: StageEvent) {
    report.record(&event);
    state.record(event);
}
