//! TestDriver - one entry point per pipeline stage
//!
//! Generation entry points return the generated text. Tool-running entry
//! points return a Markdown report; the caller reads outcome from its text.

use std::path::Path;
use std::sync::Arc;

use log::{info, warn};

use crate::classify::ResultClassifier;
use crate::engine::{CycleRequest, IterationEngine, OrchestrationConfig};
use crate::error::Result;
use crate::generation::{GenerationGateway, RoleTemplate};
use crate::language::{LanguageAdapter, LanguageProfile, Stage};
use crate::process::{CommandRunner, ProcessResult};
use crate::prompt::{PromptRenderer, tail_chars};

/// Base URL used when a UI test request names none
pub const DEFAULT_UI_BASE_URL: &str = "http://localhost:3000";

const REPORT_STDOUT_TAIL_CHARS: usize = 3000;
const REPORT_STDERR_TAIL_CHARS: usize = 1000;

pub struct TestDriver<R, G>
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

impl<R, G> TestDriver<R, G>
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

    /// Unit tests for `source` that pin down `spec`
    pub async fn generate_tests(&self, spec: &str, source: &str, profile: LanguageProfile) -> Result<String> {
        let context = self.renderer.tdd_context(spec, source, profile)?;
        self.generate(RoleTemplate::TddTests, &context).await
    }

    /// Integration tests for an HTTP endpoint
    pub async fn generate_api_tests(
        &self,
        endpoint_spec: &str,
        controller: &str,
        profile: LanguageProfile,
    ) -> Result<String> {
        let context = self.renderer.api_context(endpoint_spec, controller, profile)?;
        self.generate(RoleTemplate::ApiTests, &context).await
    }

    /// Playwright tests for a UI flow
    pub async fn generate_ui_tests(&self, ui_spec: &str, base_url: Option<&str>) -> Result<String> {
        let context = self
            .renderer
            .ui_context(ui_spec, base_url.unwrap_or(DEFAULT_UI_BASE_URL))?;
        self.generate(RoleTemplate::PlaywrightTests, &context).await
    }

    pub async fn analyze_quality(&self, tests: &str, production: &str) -> Result<String> {
        let context = self.renderer.quality_context(tests, production)?;
        self.generate(RoleTemplate::QualityAnalysis, &context).await
    }

    /// Run mutation testing once and report on it, with suggestions when
    /// mutants survive.
    pub async fn run_mutation_analysis(&self, project_dir: &Path, profile: LanguageProfile) -> String {
        info!("Running mutation analysis: profile={}, dir={}", profile, project_dir.display());
        let result = self
            .adapter
            .command_for(Stage::MutationAnalysis, profile)
            .execute(self.runner.as_ref(), project_dir, self.config.stage_timeout)
            .await;

        let mut report = String::from("## Mutation Testing Report\n\n");
        push_status(&mut report, &result);
        if result.timed_out {
            report.push_str("Mutation testing timed out. Narrow the run to fewer target classes or tests.\n");
            return report;
        }
        push_output(&mut report, &result);

        if self.classifier.has_survivors(&result.stdout) {
            let suggestions = match self.renderer.suggestions_context(&result.stdout) {
                Ok(context) => self.generate(RoleTemplate::MutationImprovement, &context).await,
                Err(e) => Err(e),
            };
            match suggestions {
                Ok(text) => report.push_str(&format!("\n### Improvement Suggestions\n{}\n", text)),
                Err(e) => {
                    warn!("No improvement suggestions: {}", e);
                    report.push_str(&format!("\n### Improvement Suggestions\n_(unavailable: {})_\n", e));
                }
            }
        }
        report
    }

    /// Generate, compile, test, mutate and improve until a stop condition
    pub async fn run_full_cycle(&self, request: &CycleRequest) -> String {
        let engine = IterationEngine::new(self.runner.clone(), self.gateway.clone(), self.config.clone());
        engine.run(request).await
    }

    /// Run the Playwright suite in `work_dir` and report on it
    pub async fn run_ui_tests(&self, work_dir: &Path) -> String {
        let command = self.adapter.browser_tests();
        info!("Running browser tests: {}", command.display());
        let result = self
            .runner
            .execute(&command.argv, work_dir, command.effective_timeout(self.config.stage_timeout))
            .await;

        let mut report = String::from("## Browser Test Report\n\n");
        push_status(&mut report, &result);
        if result.timed_out {
            report.push_str("Browser tests timed out.\n");
            return report;
        }
        push_output(&mut report, &result);
        report
    }

    async fn generate(&self, role: RoleTemplate, context: &str) -> Result<String> {
        info!("Generating with role {} (model {})", role, self.gateway.model());
        Ok(self.gateway.generate(role, context).await?)
    }
}

fn push_status(report: &mut String, result: &ProcessResult) {
    report.push_str(&format!("**Exit code**: {}\n", result.exit_code));
    report.push_str(&format!("**Timed out**: {}\n\n", result.timed_out));
}

fn push_output(report: &mut String, result: &ProcessResult) {
    report.push_str(&format!(
        "### Output\n```\n{}\n```\n",
        tail_chars(&result.stdout, REPORT_STDOUT_TAIL_CHARS)
    ));
    if !result.stderr.is_empty() {
        report.push_str(&format!(
            "\n### Errors\n```\n{}\n```\n",
            tail_chars(&result.stderr, REPORT_STDERR_TAIL_CHARS)
        ));
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::TestDriverError;
    use crate::generation::MockGateway;

    /// Returns the same result for every command and records argv
    struct FixedRunner {
        result: ProcessResult,
        calls: Mutex<Vec<(Vec<String>, PathBuf, Duration)>>,
    }

    impl FixedRunner {
        fn new(result: ProcessResult) -> Self {
            Self {
                result,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn commands(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(argv, _, _)| argv.join(" ")).collect()
        }
    }

    #[async_trait]
    impl CommandRunner for FixedRunner {
        async fn execute(&self, command: &[String], working_dir: &Path, timeout: Duration) -> ProcessResult {
            self.calls
                .lock()
                .unwrap()
                .push((command.to_vec(), working_dir.to_path_buf(), timeout));
            self.result.clone()
        }
    }

    fn driver(result: ProcessResult, gateway: MockGateway) -> (TestDriver<FixedRunner, MockGateway>, Arc<FixedRunner>, Arc<MockGateway>) {
        let runner = Arc::new(FixedRunner::new(result));
        let gateway = Arc::new(gateway);
        let driver = TestDriver::new(runner.clone(), gateway.clone(), OrchestrationConfig::default());
        (driver, runner, gateway)
    }

    #[tokio::test]
    async fn test_generate_tests_uses_tdd_role() {
        let (driver, _, gateway) = driver(ProcessResult::completed(0, "", ""), MockGateway::new(vec!["class MoneyTest {}"]));

        let code = driver
            .generate_tests("adds amounts", "class Money {}", LanguageProfile::Java)
            .await
            .unwrap();

        assert_eq!(code, "class MoneyTest {}");
        let calls = gateway.calls();
        assert_eq!(calls[0].role, RoleTemplate::TddTests);
        assert!(calls[0].context.contains("## Source Code (java)"));
    }

    #[tokio::test]
    async fn test_generate_api_and_quality_roles() {
        let (driver, _, gateway) = driver(ProcessResult::completed(0, "", ""), MockGateway::new(vec!["a", "b"]));

        driver
            .generate_api_tests("POST /transfer", "def transfer(): ...", LanguageProfile::Python)
            .await
            .unwrap();
        driver.analyze_quality("assert x", "fn x()").await.unwrap();

        let roles: Vec<RoleTemplate> = gateway.calls().iter().map(|c| c.role).collect();
        assert_eq!(roles, vec![RoleTemplate::ApiTests, RoleTemplate::QualityAnalysis]);
    }

    #[tokio::test]
    async fn test_generate_ui_tests_default_base_url() {
        let (driver, _, gateway) = driver(ProcessResult::completed(0, "", ""), MockGateway::new(vec!["test()"]));

        driver.generate_ui_tests("login flow", None).await.unwrap();

        let calls = gateway.calls();
        assert_eq!(calls[0].role, RoleTemplate::PlaywrightTests);
        assert!(calls[0].context.contains(DEFAULT_UI_BASE_URL));
    }

    #[tokio::test]
    async fn test_generation_error_surfaces() {
        let (driver, _, _) = driver(
            ProcessResult::completed(0, "", ""),
            MockGateway::new(Vec::<String>::new()).then_fail("rate limited"),
        );

        let err = driver.analyze_quality("t", "p").await.unwrap_err();
        assert!(matches!(err, TestDriverError::Generation(_)));
    }

    #[tokio::test]
    async fn test_mutation_report_with_survivors() {
        let result = ProcessResult::completed(1, ">> Line 12: SURVIVED", "warning: slow");
        let (driver, runner, gateway) = driver(result, MockGateway::new(vec!["Assert the boundary."]));

        let report = driver
            .run_mutation_analysis(Path::new("/project"), LanguageProfile::Java)
            .await;

        assert!(report.starts_with("## Mutation Testing Report"));
        assert!(report.contains("**Exit code**: 1"));
        assert!(report.contains("**Timed out**: false"));
        assert!(report.contains(">> Line 12: SURVIVED"));
        assert!(report.contains("### Errors\n```\nwarning: slow\n```"));
        assert!(report.contains("### Improvement Suggestions\nAssert the boundary."));
        assert_eq!(gateway.calls()[0].role, RoleTemplate::MutationImprovement);
        assert_eq!(runner.commands(), vec!["mvn -B --fail-at-end test pitest:mutationCoverage"]);
    }

    #[tokio::test]
    async fn test_mutation_report_python_runs_summary() {
        let result = ProcessResult::completed(0, "Killed 10 (100%)", "");
        let (driver, runner, gateway) = driver(result, MockGateway::new(Vec::<String>::new()));

        let report = driver
            .run_mutation_analysis(Path::new("/project"), LanguageProfile::Python)
            .await;

        assert_eq!(runner.commands().len(), 2);
        assert!(report.contains("--- RESULTS ---"));
        assert!(!report.contains("### Errors"));
        assert!(!report.contains("Improvement Suggestions"));
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mutation_report_timeout_only_hints() {
        let (driver, runner, gateway) = driver(ProcessResult::timed_out(), MockGateway::new(vec!["unused"]));

        let report = driver
            .run_mutation_analysis(Path::new("/project"), LanguageProfile::Python)
            .await;

        assert!(report.contains("**Timed out**: true"));
        assert!(report.contains("Mutation testing timed out"));
        assert!(!report.contains("### Output"));
        assert_eq!(runner.commands().len(), 1);
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mutation_suggestion_failure_is_reported() {
        let result = ProcessResult::completed(0, "3 survived", "");
        let (driver, _, _) = driver(result, MockGateway::new(Vec::<String>::new()).then_fail("boom"));

        let report = driver
            .run_mutation_analysis(Path::new("/project"), LanguageProfile::Java)
            .await;

        assert!(report.contains("_(unavailable: "));
        assert!(report.contains("boom"));
    }

    #[tokio::test]
    async fn test_run_ui_tests_report() {
        let result = ProcessResult::completed(0, "{\"stats\":{}}", "");
        let (driver, runner, _) = driver(result, MockGateway::new(Vec::<String>::new()));

        let report = driver.run_ui_tests(Path::new("/web")).await;

        assert!(report.starts_with("## Browser Test Report"));
        assert!(report.contains("{\"stats\":{}}"));
        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].0.join(" "), "npx playwright test --reporter=json");
        assert_eq!(calls[0].1, PathBuf::from("/web"));
        assert_eq!(calls[0].2, Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_run_full_cycle_returns_trace() {
        let result = ProcessResult::completed(0, "Killed 4 (100%)", "");
        let (driver, _, _) = driver(result, MockGateway::new(vec!["def test_x(): pass"]));
        let request = CycleRequest::new("spec", "def x(): pass", "/project", LanguageProfile::Python);

        let report = driver.run_full_cycle(&request).await;

        assert!(report.starts_with("# Test Cycle Report"));
        assert!(report.contains("all mutants killed"));
    }
}
