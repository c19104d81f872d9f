use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use testdriver::engine::OrchestrationConfig;
use testdriver::generation::{DEFAULT_API_KEY_ENV, GatewayConfig};
use testdriver::language::LanguageProfile;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub orchestration: OrchestrationSection,
    pub language: LanguageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_ms: u64,
    /// Retries for rate limits, server errors and network failures
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let gateway = GatewayConfig::default();
        Self {
            base_url: gateway.base_url,
            model: gateway.model,
            temperature: gateway.temperature,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_ms: 300000,
            max_retries: gateway.max_retries,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationSection {
    pub max_iterations: u32,
    pub stage_timeout_ms: u64,
    pub max_compile_fixes: u32,
}

impl Default for OrchestrationSection {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            stage_timeout_ms: 600000,
            max_compile_fixes: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Profile used when a command names none
    pub default: String,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            default: LanguageProfile::Java.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            orchestration: OrchestrationSection::default(),
            language: LanguageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Validated, immutable bounds for one run
    pub fn orchestration(&self) -> Result<OrchestrationConfig> {
        let section = &self.orchestration;
        let config = OrchestrationConfig::new(section.max_iterations, Duration::from_millis(section.stage_timeout_ms))
            .context("Invalid orchestration settings")?;
        Ok(config.with_max_compile_fixes(section.max_compile_fixes))
    }

    pub fn llm(&self) -> GatewayConfig {
        GatewayConfig {
            base_url: self.llm.base_url.clone(),
            model: self.llm.model.clone(),
            temperature: self.llm.temperature,
            timeout: Duration::from_millis(self.llm.timeout_ms),
            max_retries: self.llm.max_retries,
            ..GatewayConfig::default()
        }
    }

    pub fn default_profile(&self) -> Result<LanguageProfile> {
        self.language
            .default
            .parse::<LanguageProfile>()
            .context("Invalid default language in config")
    }
}
