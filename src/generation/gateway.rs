//! Gateway trait, its error type and a scripted mock

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::roles::RoleTemplate;

/// Stateless generation client - each call is independent (fresh context)
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Generate artifact text for `context` under the given role.
    ///
    /// Blocks the caller until the external capability answers; no timeout
    /// is enforced at this layer beyond the transport's own.
    async fn generate(&self, role: RoleTemplate, context: &str) -> Result<String, GenerationError>;

    /// Model identifier, for reports and logs
    fn model(&self) -> &str;
}

/// Errors that can occur during generation
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing API key: environment variable {env_var} not set")]
    MissingApiKey { env_var: String },
}

impl GenerationError {
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::ApiError { status, .. } => *status == 429 || *status >= 500,
            GenerationError::Network(_) => true,
            GenerationError::InvalidResponse(_) => false,
            GenerationError::Json(_) => false,
            GenerationError::MissingApiKey { .. } => false,
        }
    }
}

/// One recorded call to a `MockGateway`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationCall {
    pub role: RoleTemplate,
    pub context: String,
}

/// Gateway returning scripted responses in order.
///
/// Once the script runs out every call returns an empty string.
pub struct MockGateway {
    responses: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<GenerationCall>>,
}

impl MockGateway {
    pub fn new<S: Into<String>>(responses: Vec<S>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a transport failure after the responses scripted so far
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(message.into()));
        self
    }

    /// All calls so far, oldest first
    pub fn calls(&self) -> Vec<GenerationCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl GenerationGateway for MockGateway {
    async fn generate(&self, role: RoleTemplate, context: &str) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(GenerationCall {
                role,
                context: context.to_string(),
            });

        let next = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(GenerationError::InvalidResponse(message)),
            None => Ok(String::new()),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
