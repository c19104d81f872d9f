//! Per-run orchestration settings

use std::time::Duration;

use crate::error::{Result, TestDriverError};

/// Read-only settings for one orchestration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationConfig {
    /// Outer iterations (compile, test, mutate, decide); at least 1
    pub max_iterations: u32,
    /// Deadline applied to every stage command
    pub stage_timeout: Duration,
    /// Compile-fix generations allowed within one outer iteration
    pub max_compile_fixes: u32,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            stage_timeout: Duration::from_secs(600),
            max_compile_fixes: 3,
        }
    }
}

impl OrchestrationConfig {
    pub fn new(max_iterations: u32, stage_timeout: Duration) -> Result<Self> {
        if max_iterations == 0 {
            return Err(TestDriverError::Config("max_iterations must be at least 1".to_string()));
        }
        if stage_timeout.is_zero() {
            return Err(TestDriverError::Config("stage timeout must be non-zero".to_string()));
        }
        Ok(Self {
            max_iterations,
            stage_timeout,
            ..Default::default()
        })
    }

    pub fn with_max_compile_fixes(mut self, max_compile_fixes: u32) -> Self {
        self.max_compile_fixes = max_compile_fixes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = OrchestrationConfig::default();
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.stage_timeout, Duration::from_secs(600));
        assert_eq!(config.max_compile_fixes, 3);
    }

    #[test]
    fn test_new_valid() {
        let config = OrchestrationConfig::new(5, Duration::from_secs(30))
            .unwrap()
            .with_max_compile_fixes(1);
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.stage_timeout, Duration::from_secs(30));
        assert_eq!(config.max_compile_fixes, 1);
    }

    #[test]
    fn test_new_rejects_zero_iterations() {
        let err = OrchestrationConfig::new(0, Duration::from_secs(30)).unwrap_err();
        assert!(matches!(err, TestDriverError::Config(_)));
    }

    #[test]
    fn test_new_rejects_zero_timeout() {
        assert!(OrchestrationConfig::new(1, Duration::ZERO).is_err());
    }
}
