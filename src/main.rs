use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use testdriver::driver::TestDriver;
use testdriver::engine::{CycleRequest, OrchestrationConfig, StopReason};
use testdriver::generation::{GenerationError, OpenAiGateway};
use testdriver::language::LanguageProfile;
use testdriver::process::ProcessRunner;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

type Driver = TestDriver<ProcessRunner, OpenAiGateway>;

fn setup_logging(level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("testdriver")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("testdriver.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.unwrap_or("info")))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Commands that can still do useful work when no API key is set
fn generation_optional(command: &Commands) -> bool {
    matches!(command, Commands::RunMutation { .. } | Commands::RunUiTests { .. })
}

fn build_gateway(config: &Config, required: bool) -> Result<OpenAiGateway> {
    match OpenAiGateway::new(config.llm(), &config.llm.api_key_env) {
        Ok(gateway) => Ok(gateway),
        Err(GenerationError::MissingApiKey { env_var }) if !required => {
            warn!("{} is not set, generation requests will fail", env_var);
            Ok(OpenAiGateway::with_api_key(String::new(), config.llm())?)
        }
        Err(e) => Err(e).context("Failed to create generation gateway"),
    }
}

fn resolve_profile(language: Option<&str>, config: &Config) -> Result<LanguageProfile> {
    match language {
        Some(name) => name.parse::<LanguageProfile>().context("Invalid --language"),
        None => config.default_profile(),
    }
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).context(format!("Failed to read {}", path.display()))
}

fn emit(cli: &Cli, text: &str) -> Result<()> {
    match &cli.output {
        Some(path) => {
            fs::write(path, text).context(format!("Failed to write {}", path.display()))?;
            eprintln!("{} {}", "Wrote".green(), path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn print_outcome(report: &str) {
    let closing = report.rsplit("## Outcome").next().unwrap_or(report);
    let outcome = [
        StopReason::AllMutantsKilled,
        StopReason::IterationBudgetExhausted,
        StopReason::CompileFixesExhausted,
    ]
    .into_iter()
    .find(|reason| closing.contains(reason.marker()));

    match outcome {
        Some(StopReason::AllMutantsKilled) => eprintln!("{} {}", "Outcome:".green(), StopReason::AllMutantsKilled),
        Some(reason) => eprintln!("{} {}", "Outcome:".yellow(), reason),
        None => eprintln!("{} no outcome marker in report", "Outcome:".red()),
    }
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        eprintln!("{}", "Verbose mode enabled".yellow());
    }

    let orchestration = match &cli.command {
        Commands::RunCycle {
            max_iterations: Some(max_iterations),
            ..
        } => {
            let base = config.orchestration()?;
            OrchestrationConfig::new(*max_iterations, base.stage_timeout)
                .context("Invalid --max-iterations")?
                .with_max_compile_fixes(base.max_compile_fixes)
        }
        _ => config.orchestration()?,
    };

    let gateway = build_gateway(config, !generation_optional(&cli.command))?;
    if cli.is_verbose() {
        eprintln!("{} {}", "Model:".cyan(), config.llm.model);
    }
    let driver: Driver = TestDriver::new(Arc::new(ProcessRunner::new()), Arc::new(gateway), orchestration);

    let text = match &cli.command {
        Commands::GenerateTests { spec, source, language } => {
            let profile = resolve_profile(language.as_deref(), config)?;
            driver
                .generate_tests(&read_input(spec)?, &read_input(source)?, profile)
                .await
                .context("Test generation failed")?
        }
        Commands::GenerateApiTests {
            endpoint_spec,
            controller,
            language,
        } => {
            let profile = resolve_profile(language.as_deref(), config)?;
            driver
                .generate_api_tests(&read_input(endpoint_spec)?, &read_input(controller)?, profile)
                .await
                .context("API test generation failed")?
        }
        Commands::GenerateUiTests { ui_spec, base_url } => driver
            .generate_ui_tests(&read_input(ui_spec)?, base_url.as_deref())
            .await
            .context("UI test generation failed")?,
        Commands::RunMutation { project_dir, language } => {
            let profile = resolve_profile(language.as_deref(), config)?;
            eprintln!("{} {}", "Mutation testing:".cyan(), project_dir.display());
            driver.run_mutation_analysis(project_dir, profile).await
        }
        Commands::AnalyzeQuality { tests, production } => driver
            .analyze_quality(&read_input(tests)?, &read_input(production)?)
            .await
            .context("Quality analysis failed")?,
        Commands::RunCycle {
            spec,
            source,
            project_dir,
            language,
            test_file,
            ..
        } => {
            let profile = resolve_profile(language.as_deref(), config)?;
            let mut request = CycleRequest::new(read_input(spec)?, read_input(source)?, project_dir, profile);
            if let Some(test_file) = test_file {
                request = request.with_test_file(test_file);
            }
            eprintln!("{} {} ({})", "Test cycle:".cyan(), project_dir.display(), profile);
            let report = driver.run_full_cycle(&request).await;
            print_outcome(&report);
            report
        }
        Commands::RunUiTests { work_dir } => {
            eprintln!("{} {}", "Browser tests:".cyan(), work_dir.display());
            driver.run_ui_tests(work_dir).await
        }
    };

    emit(cli, &text)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
