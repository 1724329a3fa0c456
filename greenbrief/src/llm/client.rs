//! HTTP chat-completions client.
//!
//! Targets any OpenAI-compatible completions endpoint. The reply schema is
//! passed as the system message and JSON mode is requested, but the raw
//! completion text is returned untouched; validation stays with the
//! pipeline.

use super::{GenerationRequest, Generator};
use crate::errors::GenerationError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECONDS: f64 = 120.0;

/// Configuration for the chat client.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// API key, if configured.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Base URL of the completions API.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_seconds: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl GenerationConfig {
    /// Reads configuration from `OPENAI_API_KEY`, `GREENBRIEF_MODEL`, and
    /// `GREENBRIEF_LLM_BASE_URL`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            model: std::env::var("GREENBRIEF_MODEL").unwrap_or(defaults.model),
            base_url: std::env::var("GREENBRIEF_LLM_BASE_URL").unwrap_or(defaults.base_url),
            timeout_seconds: defaults.timeout_seconds,
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// OpenAI-compatible chat-completions client.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl ChatClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` if the HTTP client cannot be built.
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs_f64(config.timeout_seconds))
            .build()
            .map_err(|e| GenerationError::Http(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }
}

#[async_trait]
impl Generator for ChatClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(GenerationError::MissingApiKey);
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        let payload = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": request.response_schema},
                {"role": "user", "content": request.prompt},
            ],
            "response_format": {"type": "json_object"},
        });

        tracing::debug!(model = %self.config.model, "requesting completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout {
                        seconds: self.config.timeout_seconds,
                    }
                } else {
                    GenerationError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(GenerationError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Http(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::Empty)
    }
}
