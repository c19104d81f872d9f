//! Mutation-analysis output classification
//!
//! This is a best-effort text scan, not a parse of the tool's report format.
//! A literal `100%` anywhere means every mutant was killed; a case-insensitive
//! `survived` means at least one was not. A change in the mutation tool's
//! wording silently changes the verdict.

/// Literal token meaning every mutant was killed
pub const FULL_KILL_TOKEN: &str = "100%";

/// Token (matched case-insensitively) meaning a mutant survived
pub const SURVIVED_TOKEN: &str = "survived";

/// What a mutation run's output says about the suite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationVerdict {
    /// Output contains `100%`
    FullyKilled,
    /// Output mentions survivors and not `100%`
    SurvivorsPresent,
    /// Neither token found
    Inconclusive,
}

impl MutationVerdict {
    pub fn label(&self) -> &'static str {
        match self {
            MutationVerdict::FullyKilled => "all mutants killed",
            MutationVerdict::SurvivorsPresent => "survivors present",
            MutationVerdict::Inconclusive => "inconclusive",
        }
    }
}

/// Stateless classifier over mutation tool output
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultClassifier;

impl ResultClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn is_fully_killed(&self, mutation_output: &str) -> bool {
        mutation_output.contains(FULL_KILL_TOKEN)
    }

    pub fn has_survivors(&self, mutation_output: &str) -> bool {
        !self.is_fully_killed(mutation_output)
            && mutation_output.to_lowercase().contains(SURVIVED_TOKEN)
    }

    pub fn classify(&self, mutation_output: &str) -> MutationVerdict {
        if self.is_fully_killed(mutation_output) {
            MutationVerdict::FullyKilled
        } else if self.has_survivors(mutation_output) {
            MutationVerdict::SurvivorsPresent
        } else {
            MutationVerdict::Inconclusive
        }
    }
}
