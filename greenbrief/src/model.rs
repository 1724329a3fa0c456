//! Data model for training runs: stage records, source references, and the
//! final training report.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a cited source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCategory {
    /// Directives, regulations, and official guidance.
    Regulatory,
    /// Real company cases, good or bad.
    CompanyExample,
    /// Published best practices and frameworks.
    BestPractice,
    /// Market studies and industry statistics.
    MarketResearch,
    /// News coverage.
    News,
}

impl SourceCategory {
    /// All categories in report display order.
    pub const ALL: [Self; 5] = [
        Self::Regulatory,
        Self::CompanyExample,
        Self::BestPractice,
        Self::MarketResearch,
        Self::News,
    ];

    /// Human-readable label used in the assembled report.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Regulatory => "Regulatory",
            Self::CompanyExample => "Company Examples",
            Self::BestPractice => "Best Practices",
            Self::MarketResearch => "Market Research",
            Self::News => "News",
        }
    }
}

impl std::fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Regulatory => write!(f, "regulatory"),
            Self::CompanyExample => write!(f, "company_example"),
            Self::BestPractice => write!(f, "best_practice"),
            Self::MarketResearch => write!(f, "market_research"),
            Self::News => write!(f, "news"),
        }
    }
}

/// A deduplicated citation record.
///
/// Created when a stage reports a citation; when the same URL reappears from
/// another stage the existing record is merged, never replaced: the
/// contributing stage list grows and empty fields are backfilled, while
/// populated fields keep their first-seen values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReference {
    /// Source title.
    pub title: String,
    /// Source URL. Uniqueness key after normalization.
    pub url: String,
    /// Source category.
    pub category: SourceCategory,
    /// Short description of the source content.
    #[serde(default)]
    pub description: String,
    /// Date the source was accessed.
    pub access_date: NaiveDate,
    /// Stages that cited this source, in first-appearance order.
    #[serde(default)]
    pub contributing_stages: Vec<String>,
    /// Search query that surfaced the source, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl SourceReference {
    /// Returns true if `stage` already contributed this source.
    #[must_use]
    pub fn cited_by(&self, stage: &str) -> bool {
        self.contributing_stages.iter().any(|s| s == stage)
    }
}

/// The output of one executed stage.
///
/// Owned by the context accumulator once written; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage name (unique within a run).
    pub stage: String,
    /// Display title used as the section heading in the report.
    pub title: String,
    /// Generated narrative text.
    pub narrative: String,
    /// Sources cited by this stage, in reply order.
    #[serde(default)]
    pub sources: Vec<SourceReference>,
}

impl StageRecord {
    /// Creates a new stage record.
    #[must_use]
    pub fn new(
        stage: impl Into<String>,
        title: impl Into<String>,
        narrative: impl Into<String>,
        sources: Vec<SourceReference>,
    ) -> Self {
        Self {
            stage: stage.into(),
            title: title.into(),
            narrative: narrative.into(),
            sources,
        }
    }
}

/// The terminal artifact of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Session identifier (e.g. `TRAIN_20260806_141500`).
    pub session_id: String,
    /// Unique run id.
    pub run_id: Uuid,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Stage records in pipeline order.
    pub stages: Vec<StageRecord>,
    /// Deduplicated sources in first-appearance order.
    pub sources: Vec<SourceReference>,
}

impl TrainingReport {
    /// Looks up a stage record by name.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.stage == name)
    }

    /// Total number of citations before deduplication.
    #[must_use]
    pub fn citation_count(&self) -> usize {
        self.stages.iter().map(|r| r.sources.len()).sum()
    }
}
