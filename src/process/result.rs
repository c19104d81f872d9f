//! Outcome of a single external command execution

/// Exit code reported when a command timed out or could not be launched
pub const SENTINEL_EXIT_CODE: i32 = -1;

/// stderr text reported for a timed-out command
pub const TIMEOUT_MESSAGE: &str = "Process timed out";

/// Result of running one command. Immutable once built.
///
/// `timed_out == true` implies `exit_code == SENTINEL_EXIT_CODE` and an empty
/// stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl ProcessResult {
    /// Result of a command that ran to completion
    pub fn completed(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            timed_out: false,
        }
    }

    /// Result of a command killed at its deadline
    pub fn timed_out() -> Self {
        Self {
            exit_code: SENTINEL_EXIT_CODE,
            stdout: String::new(),
            stderr: TIMEOUT_MESSAGE.to_string(),
            timed_out: true,
        }
    }

    /// Result of a command that never started
    pub fn launch_failure(diagnostic: impl Into<String>) -> Self {
        Self {
            exit_code: SENTINEL_EXIT_CODE,
            stdout: String::new(),
            stderr: diagnostic.into(),
            timed_out: false,
        }
    }

    /// Whether the command exited with code 0
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    /// Whether the command ran at all (exited on its own, any code)
    pub fn ran(&self) -> bool {
        self.exit_code != SENTINEL_EXIT_CODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed() {
        let result = ProcessResult::completed(0, "out", "err");
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "out");
        assert_eq!(result.stderr, "err");
        assert!(!result.timed_out);
        assert!(result.succeeded());
        assert!(result.ran());
    }

    #[test]
    fn test_timed_out_invariant() {
        let result = ProcessResult::timed_out();
        assert!(result.timed_out);
        assert_eq!(result.exit_code, SENTINEL_EXIT_CODE);
        assert!(result.stdout.is_empty());
        assert_eq!(result.stderr, "Process timed out");
        assert!(!result.succeeded());
        assert!(!result.ran());
    }

    #[test]
    fn test_launch_failure() {
        let result = ProcessResult::launch_failure("No such file or directory");
        assert_eq!(result.exit_code, -1);
        assert!(!result.timed_out);
        assert!(result.stderr.contains("No such file"));
        assert!(!result.ran());
    }

    #[test]
    fn test_nonzero_exit_is_not_success() {
        let result = ProcessResult::completed(2, "", "syntax error");
        assert!(!result.succeeded());
        assert!(result.ran());
    }
}
