//! Serper search client.

use super::{SearchHit, SearchProvider};
use crate::errors::SearchError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://google.serper.dev/search";
const DEFAULT_NUM_RESULTS: u32 = 10;
const DEFAULT_TIMEOUT_SECONDS: f64 = 10.0;

/// Configuration for the Serper client.
#[derive(Debug, Clone)]
pub struct SerperConfig {
    /// API key, if configured.
    pub api_key: Option<String>,
    /// Search endpoint.
    pub endpoint: String,
    /// Number of results to request.
    pub num_results: u32,
    /// Geographic location code.
    pub country: String,
    /// Language code.
    pub language: String,
    /// Request timeout in seconds.
    pub timeout_seconds: f64,
}

impl Default for SerperConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            num_results: DEFAULT_NUM_RESULTS,
            country: "us".to_string(),
            language: "en".to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl SerperConfig {
    /// Reads the API key from `SERPER_API_KEY`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("SERPER_API_KEY").ok(),
            ..Self::default()
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
    #[serde(default)]
    news: Vec<NewsResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Deserialize)]
struct NewsResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    date: Option<String>,
}

/// Serper-backed search provider.
#[derive(Debug, Clone)]
pub struct SerperClient {
    http: reqwest::Client,
    config: SerperConfig,
}

impl SerperClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `SearchError` if the HTTP client cannot be built.
    pub fn new(config: SerperConfig) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs_f64(config.timeout_seconds))
            .build()
            .map_err(|e| SearchError::Http(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &SerperConfig {
        &self.config
    }
}

#[async_trait]
impl SearchProvider for SerperClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(SearchError::MissingApiKey);
        };

        let payload = serde_json::json!({
            "q": query,
            "num": self.config.num_results,
            "gl": self.config.country,
            "hl": self.config.language,
        });

        tracing::debug!(query = %query, "searching");

        let response = self
            .http
            .post(&self.config.endpoint)
            .header("X-API-KEY", api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SearchError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: SerperResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Http(e.to_string()))?;

        let mut hits: Vec<SearchHit> = parsed
            .organic
            .into_iter()
            .filter(|r| !r.link.is_empty())
            .map(|r| SearchHit {
                title: r.title,
                url: r.link,
                snippet: r.snippet,
                date: None,
            })
            .collect();

        hits.extend(
            parsed
                .news
                .into_iter()
                .filter(|r| !r.link.is_empty())
                .map(|r| SearchHit {
                    title: r.title,
                    url: r.link,
                    snippet: r.snippet,
                    date: r.date.or_else(|| Some(String::new())),
                }),
        );

        Ok(hits)
    }
}
