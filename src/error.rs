//! Error types for TestDriver
//!
//! Centralized error handling using thiserror. Operational failures of
//! external tools are data (see `process::ProcessResult`), not errors.

use thiserror::Error;

/// All error types that can occur in TestDriver
#[derive(Debug, Error)]
pub enum TestDriverError {
    /// Language profile name not in the supported set
    #[error("Unsupported language profile: {0} (supported: java, python)")]
    UnsupportedProfile(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Text generation failed
    #[error("Generation error: {0}")]
    Generation(#[from] crate::generation::GenerationError),

    /// Prompt template rendering failed
    #[error("Template error: {0}")]
    Template(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for TestDriver operations
pub type Result<T> = std::result::Result<T, TestDriverError>;
