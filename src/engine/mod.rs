//! Feedback-driven test generation cycle
//!
//! - `IterationEngine` - runs generate, compile, test, mutate and improve
//! - `IterationState` / `StageEvent` - per-run state and its history
//! - `OrchestrationConfig` - read-only bounds for one run

mod config;
mod iteration;
mod state;

pub use config::OrchestrationConfig;
pub use iteration::{CycleRequest, IterationEngine};
pub use state::{GenerationReason, IterationState, StageEvent, StageName, StageOutcome, StopReason};
