//! Text-generation collaborator.
//!
//! The pipeline treats generation as an opaque service: a prompt and a
//! response-schema description go in, raw text comes out. Validation of
//! that text happens in [`reply`], not here.

pub mod reply;

#[cfg(feature = "remote")]
pub mod client;

pub use reply::{SourceDraft, StageReply, RESPONSE_SCHEMA};

#[cfg(feature = "remote")]
pub use client::{ChatClient, GenerationConfig};

use crate::errors::GenerationError;
use async_trait::async_trait;

/// A single generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The assembled stage prompt.
    pub prompt: String,
    /// Description of the reply shape the caller expects.
    pub response_schema: String,
}

impl GenerationRequest {
    /// Creates a request with the standard stage-reply schema.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: RESPONSE_SCHEMA.to_string(),
        }
    }
}

/// Opaque text-completion service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generates a completion for the request.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}
