//! Process execution layer
//!
//! Runs one external command with a deadline and reports the outcome as a
//! `ProcessResult`. Launch failures and timeouts are results, never errors.

mod result;
mod runner;

pub use result::{ProcessResult, TIMEOUT_MESSAGE, SENTINEL_EXIT_CODE};
pub use runner::{CommandRunner, ProcessRunner};
