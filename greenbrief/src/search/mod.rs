//! Web-search collaborator.
//!
//! Stages use search to ground their prompts in current material. The
//! pipeline only needs a ranked hit list per query; ranking and retrieval
//! stay opaque.

#[cfg(feature = "remote")]
pub mod serper;

#[cfg(feature = "remote")]
pub use serper::{SerperClient, SerperConfig};

use crate::errors::SearchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Result snippet.
    #[serde(default)]
    pub snippet: String,
    /// Publication date, present for news results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Opaque query-to-results service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Searches the web, returning ranked hits.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;
}

/// Formats hits into the research block embedded in a stage prompt.
///
/// Dated hits are listed separately as recent news.
#[must_use]
pub fn format_hits(query: &str, hits: &[SearchHit]) -> String {
    let mut block = format!("Search results for \"{query}\":\n");

    let organic: Vec<&SearchHit> = hits.iter().filter(|h| h.date.is_none()).collect();
    let news: Vec<&SearchHit> = hits.iter().filter(|h| h.date.is_some()).collect();

    for (i, hit) in organic.iter().enumerate() {
        let _ = writeln!(block, "{}. {}", i + 1, hit.title);
        if !hit.snippet.is_empty() {
            let _ = writeln!(block, "   {}", hit.snippet);
        }
        let _ = writeln!(block, "   Source: {}", hit.url);
    }

    if !news.is_empty() {
        let _ = writeln!(block, "Recent news:");
        for hit in &news {
            let date = hit.date.as_deref().unwrap_or_default();
            let _ = writeln!(block, "- {} ({date})", hit.title);
            if !hit.snippet.is_empty() {
                let _ = writeln!(block, "  {}", hit.snippet);
            }
            let _ = writeln!(block, "  Source: {}", hit.url);
        }
    }

    if organic.is_empty() && news.is_empty() {
        let _ = writeln!(block, "No relevant results.");
    }

    block
}
