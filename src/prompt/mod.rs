//! Prompt rendering - Handlebars templates for generation contexts

mod context;
mod render;

pub use context::{
    COMPILE_ERROR_TAIL_CHARS, SUGGESTION_OUTPUT_TAIL_CHARS, SURVIVOR_OUTPUT_TAIL_CHARS, tail_chars,
};
pub use render::PromptRenderer;
