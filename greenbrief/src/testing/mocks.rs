//! Scripted collaborator fakes.

use crate::errors::{GenerationError, SearchError};
use crate::llm::{GenerationRequest, Generator};
use crate::search::{SearchHit, SearchProvider};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// A generator that replays a queue of canned replies and records every
/// prompt it receives.
#[derive(Debug, Default)]
pub struct CannedGenerator {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl CannedGenerator {
    /// Creates a generator with a reply queue.
    #[must_use]
    pub fn new(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Convenience: a reply queue of well-formed stage replies with the
    /// given narratives and no sources.
    #[must_use]
    pub fn with_narratives(narratives: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(narratives.into_iter().map(|n| {
            serde_json::json!({
                "narrative": n.into(),
                "sources": [],
            })
            .to_string()
        }))
    }

    /// Prompts received so far, in call order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Number of generate calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl Generator for CannedGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        self.prompts.lock().push(request.prompt);
        self.replies
            .lock()
            .pop_front()
            .ok_or(GenerationError::Empty)
    }
}

/// A generator that always fails with the given error.
#[derive(Debug)]
pub struct FailingGenerator {
    error: GenerationError,
}

impl FailingGenerator {
    /// Creates a failing generator.
    #[must_use]
    pub fn new(error: GenerationError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl Generator for FailingGenerator {
    async fn generate(&self, _request: GenerationRequest) -> Result<String, GenerationError> {
        Err(self.error.clone())
    }
}

/// A search provider that returns the same hits for every query and
/// records the queries it saw.
#[derive(Debug, Default)]
pub struct StaticSearch {
    hits: Vec<SearchHit>,
    queries: Mutex<Vec<String>>,
    fail_with: Option<SearchError>,
}

impl StaticSearch {
    /// Creates a provider returning `hits` for every query.
    #[must_use]
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            queries: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    /// Creates a provider that fails every query.
    #[must_use]
    pub fn failing(error: SearchError) -> Self {
        Self {
            hits: Vec::new(),
            queries: Mutex::new(Vec::new()),
            fail_with: Some(error),
        }
    }

    /// Queries received so far, in call order.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        self.queries.lock().push(query.to_string());
        match &self.fail_with {
            Some(error) => Err(error.clone()),
            None => Ok(self.hits.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_generator_replays_in_order() {
        let generator = CannedGenerator::new(["one", "two"]);

        let first = generator
            .generate(GenerationRequest::new("p1"))
            .await
            .unwrap();
        let second = generator
            .generate(GenerationRequest::new("p2"))
            .await
            .unwrap();

        assert_eq!(first, "one");
        assert_eq!(second, "two");
        assert_eq!(generator.prompts(), vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_canned_generator_exhausted_queue_errors() {
        let generator = CannedGenerator::new(Vec::<String>::new());
        let err = generator
            .generate(GenerationRequest::new("p"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Empty));
    }

    #[tokio::test]
    async fn test_with_narratives_produces_valid_replies() {
        let generator = CannedGenerator::with_narratives(["hello"]);
        let raw = generator
            .generate(GenerationRequest::new("p"))
            .await
            .unwrap();

        let reply = crate::llm::StageReply::parse("s", &raw).unwrap();
        assert_eq!(reply.narrative, "hello");
    }

    #[tokio::test]
    async fn test_failing_generator() {
        let generator = FailingGenerator::new(GenerationError::RateLimited);
        let err = generator
            .generate(GenerationRequest::new("p"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::RateLimited));
    }

    #[tokio::test]
    async fn test_static_search_records_queries() {
        let search = StaticSearch::new(vec![SearchHit {
            title: "A".to_string(),
            url: "https://a.example".to_string(),
            snippet: String::new(),
            date: None,
        }]);

        let hits = search.search("greenwashing").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(search.queries(), vec!["greenwashing"]);
    }

    #[tokio::test]
    async fn test_static_search_failing() {
        let search = StaticSearch::failing(SearchError::MissingApiKey);
        assert!(search.search("q").await.is_err());
    }
}
