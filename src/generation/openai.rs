//! OpenAI-compatible chat-completions gateway
//!
//! This module implements the GenerationGateway trait for any endpoint that
//! speaks the `/chat/completions` protocol.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde_json::{Value, json};

use super::gateway::{GenerationError, GenerationGateway};
use super::roles::RoleTemplate;

/// Default API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model to use
const DEFAULT_MODEL: &str = "gpt-4o";

/// Default sampling temperature
const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Default environment variable holding the API key
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Retries after the first attempt for rate limits, 5xx and network errors
const DEFAULT_MAX_RETRIES: u32 = 3;

/// First retry delay; doubles on each further retry
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Configuration for the OpenAI-compatible gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(300),
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        }
    }
}

impl GatewayConfig {
    /// Create a new config with a specific model
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff * 2u32.saturating_pow(retry.saturating_sub(1))
    }
}

/// Chat-completions client
pub struct OpenAiGateway {
    client: Client,
    api_key: String,
    config: GatewayConfig,
}

impl OpenAiGateway {
    /// Create a gateway reading the API key from `api_key_env`
    pub fn new(config: GatewayConfig, api_key_env: &str) -> Result<Self, GenerationError> {
        let api_key = std::env::var(api_key_env).map_err(|_| GenerationError::MissingApiKey {
            env_var: api_key_env.to_string(),
        })?;

        Self::with_api_key(api_key, config)
    }

    /// Create a gateway with an explicit API key
    pub fn with_api_key(api_key: String, config: GatewayConfig) -> Result<Self, GenerationError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Build the request body
    fn build_request(&self, role: RoleTemplate, context: &str) -> Value {
        json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": [
                { "role": "system", "content": role.system_prompt() },
                { "role": "user", "content": context }
            ]
        })
    }

    /// Extract the first choice's text; a null content is an empty artifact
    fn parse_response(body: &Value) -> Result<String, GenerationError> {
        let choice = body["choices"]
            .as_array()
            .and_then(|choices| choices.first())
            .ok_or_else(|| GenerationError::InvalidResponse("response has no choices".to_string()))?;

        Ok(choice["message"]["content"].as_str().unwrap_or_default().to_string())
    }

    async fn send_request(&self, body: &Value) -> Result<Value, GenerationError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!("generation request failed with {}", status);
            return Err(GenerationError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl GenerationGateway for OpenAiGateway {
    async fn generate(&self, role: RoleTemplate, context: &str) -> Result<String, GenerationError> {
        debug!(
            "generate: role={} model={} context_chars={}",
            role,
            self.config.model,
            context.chars().count()
        );
        let body = self.build_request(role, context);

        let mut retry = 0;
        loop {
            match self.send_request(&body).await {
                Ok(response) => return Self::parse_response(&response),
                Err(e) if e.is_retryable() && retry < self.config.max_retries => {
                    retry += 1;
                    let backoff = self.config.backoff(retry);
                    warn!(
                        "generation attempt {} failed ({}), retrying in {}ms",
                        retry,
                        e,
                        backoff.as_millis()
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for OpenAiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGateway")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}
