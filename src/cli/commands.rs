//! CLI command definitions using clap.
//!
//! One subcommand per driver entry point. Text inputs are read from files;
//! results go to stdout or `--output`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TestDriver - generate and harden test suites with mutation feedback
#[derive(Parser, Debug)]
#[command(name = "testdriver")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write the result here instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate unit tests from a specification and source file
    GenerateTests {
        /// Specification file
        #[arg(long)]
        spec: PathBuf,

        /// Source file under test
        #[arg(long)]
        source: PathBuf,

        /// Language profile (java, python); defaults to the config
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Generate API integration tests for an endpoint
    GenerateApiTests {
        /// Endpoint specification file
        #[arg(long)]
        endpoint_spec: PathBuf,

        /// Controller source file
        #[arg(long)]
        controller: PathBuf,

        #[arg(short, long)]
        language: Option<String>,
    },

    /// Generate Playwright tests for a UI flow
    GenerateUiTests {
        /// UI specification file
        #[arg(long)]
        ui_spec: PathBuf,

        /// Base URL of the application under test
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Run mutation testing and report survivors
    RunMutation {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project_dir: PathBuf,

        #[arg(short, long)]
        language: Option<String>,
    },

    /// Review a test suite against its production code
    AnalyzeQuality {
        /// Test file
        #[arg(long)]
        tests: PathBuf,

        /// Production file
        #[arg(long)]
        production: PathBuf,
    },

    /// Generate, compile, test, mutate and improve until done
    RunCycle {
        #[arg(long)]
        spec: PathBuf,

        #[arg(long)]
        source: PathBuf,

        #[arg(short, long, default_value = ".")]
        project_dir: PathBuf,

        #[arg(short, long)]
        language: Option<String>,

        /// Write each artifact here before compiling (relative to project dir)
        #[arg(short, long)]
        test_file: Option<PathBuf>,

        /// Override the configured iteration budget
        #[arg(short, long)]
        max_iterations: Option<u32>,
    },

    /// Run the Playwright suite in a directory
    RunUiTests {
        #[arg(short, long, default_value = ".")]
        work_dir: PathBuf,
    },
}
