//! Generation gateway - the external text-generation collaborator
//!
//! This module provides:
//! - GenerationGateway trait for the call seam
//! - OpenAiGateway for OpenAI-compatible chat-completion endpoints
//! - MockGateway with scripted responses for tests
//! - RoleTemplate, the closed set of system prompts

mod gateway;
mod openai;
mod roles;

pub use gateway::{GenerationCall, GenerationError, GenerationGateway, MockGateway};
pub use openai::{DEFAULT_API_KEY_ENV, GatewayConfig, OpenAiGateway};
pub use roles::RoleTemplate;
