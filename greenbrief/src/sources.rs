//! Citation aggregation.
//!
//! Merges the per-stage citation lists into one deduplicated, attributed
//! list. This is a pure reduction over stage records in pipeline order;
//! output order is first appearance, which keeps runs deterministic.

use crate::model::{SourceReference, StageRecord};
use std::collections::HashMap;

/// Normalizes a URL for deduplication.
///
/// Case-insensitive and trailing-slash-insensitive:
/// `https://X.com/path` and `https://x.com/path/` share one key.
#[must_use]
pub fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_lowercase()
}

/// Accumulates citations across stage records.
#[derive(Debug, Default)]
pub struct SourceAggregator {
    sources: Vec<SourceReference>,
    by_url: HashMap<String, usize>,
}

impl SourceAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one stage record's citations into the aggregate.
    pub fn add_record(&mut self, record: &StageRecord) {
        for source in &record.sources {
            self.add(&record.stage, source);
        }
    }

    fn add(&mut self, stage: &str, source: &SourceReference) {
        let key = normalize_url(&source.url);

        if let Some(&index) = self.by_url.get(&key) {
            merge(&mut self.sources[index], stage, source);
            return;
        }

        let mut entry = source.clone();
        entry.contributing_stages = vec![stage.to_string()];
        self.by_url.insert(key, self.sources.len());
        self.sources.push(entry);
    }

    /// Number of distinct sources seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true if no sources have been seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Consumes the aggregator, returning sources in first-appearance
    /// order.
    #[must_use]
    pub fn into_sources(self) -> Vec<SourceReference> {
        self.sources
    }
}

/// First occurrence establishes the fields; later occurrences only extend
/// the attribution and backfill fields the first occurrence left empty.
/// A repeat citation from the same stage collapses silently.
fn merge(entry: &mut SourceReference, stage: &str, incoming: &SourceReference) {
    if !entry.cited_by(stage) {
        entry.contributing_stages.push(stage.to_string());
    }

    if entry.title.is_empty() && !incoming.title.is_empty() {
        entry.title = incoming.title.clone();
    }
    if entry.description.is_empty() && !incoming.description.is_empty() {
        entry.description = incoming.description.clone();
    }
    if entry.query.is_none() {
        entry.query = incoming.query.clone();
    }
}

/// Aggregates all stage records into one deduplicated citation list.
#[must_use]
pub fn aggregate<'a, I>(records: I) -> Vec<SourceReference>
where
    I: IntoIterator<Item = &'a StageRecord>,
{
    let mut aggregator = SourceAggregator::new();
    for record in records {
        aggregator.add_record(record);
    }
    aggregator.into_sources()
}
