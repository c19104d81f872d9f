//! Target-language profile

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TestDriverError;

/// Closed set of supported target languages.
///
/// Adding a variant forces every strategy match in `LanguageAdapter` to be
/// extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageProfile {
    /// Maven + JUnit, PIT for mutation analysis
    Java,
    /// pytest, mutmut for mutation analysis
    Python,
}

impl LanguageProfile {
    pub const ALL: [LanguageProfile; 2] = [LanguageProfile::Java, LanguageProfile::Python];

    pub fn name(&self) -> &'static str {
        match self {
            LanguageProfile::Java => "java",
            LanguageProfile::Python => "python",
        }
    }

    /// Whether mutation analysis is a run step followed by a results-summary
    /// step whose output is appended to the run output.
    pub fn has_mutation_summary(&self) -> bool {
        match self {
            LanguageProfile::Java => false,
            LanguageProfile::Python => true,
        }
    }
}

impl fmt::Display for LanguageProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LanguageProfile {
    type Err = TestDriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "java" => Ok(LanguageProfile::Java),
            "python" => Ok(LanguageProfile::Python),
            _ => Err(TestDriverError::UnsupportedProfile(s.to_string())),
        }
    }
}
