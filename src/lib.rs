//! TestDriver - generate, build, run and harden test suites
//!
//! A fixed pipeline asks a text-generation service for tests, compiles and
//! runs them with the project's own tools, measures them with mutation
//! testing and feeds surviving mutants back until the suite kills them all
//! or the iteration budget runs out.

pub mod classify;
pub mod driver;
pub mod engine;
pub mod error;
pub mod generation;
pub mod language;
pub mod process;
pub mod prompt;
pub mod report;

pub use error::{Result, TestDriverError};
