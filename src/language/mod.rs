//! Language profiles and the stage-to-command strategy table

mod adapter;
mod plan;
mod profile;

pub use adapter::{LanguageAdapter, Stage};
pub use plan::{CommandTemplate, RESULTS_SEPARATOR, StagePlan};
pub use profile::LanguageProfile;
