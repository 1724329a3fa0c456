//! Structured stage replies.
//!
//! Every stage asks the generation service for a JSON object holding the
//! narrative text and the sources behind it. Anything that does not parse
//! into that shape is rejected before it can reach the context
//! accumulator.

use crate::errors::MalformedOutputError;
use crate::model::{SourceCategory, SourceReference};
use chrono::NaiveDate;
use serde::Deserialize;

/// Reply-shape description sent alongside every prompt.
pub const RESPONSE_SCHEMA: &str = "\
Respond with a single JSON object and nothing else:
{
  \"narrative\": \"the full text of your answer, in Markdown\",
  \"sources\": [
    {
      \"title\": \"source title\",
      \"url\": \"https://...\",
      \"category\": \"regulatory | company_example | best_practice | market_research | news\",
      \"description\": \"one-line summary of the source\",
      \"access_date\": \"YYYY-MM-DD\",
      \"query\": \"the search query that surfaced this source\"
    }
  ]
}
List every source you relied on; use an empty list only if you used none.";

/// One citation as reported by the model.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDraft {
    /// Source title.
    #[serde(default)]
    pub title: String,
    /// Source URL.
    pub url: String,
    /// Source category.
    pub category: SourceCategory,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Access date, if the model reported one.
    #[serde(default)]
    pub access_date: Option<NaiveDate>,
    /// Originating search query, if any.
    #[serde(default)]
    pub query: Option<String>,
}

/// A validated stage reply.
#[derive(Debug, Clone, Deserialize)]
pub struct StageReply {
    /// Narrative text for the report section.
    pub narrative: String,
    /// Sources cited by the reply.
    #[serde(default)]
    pub sources: Vec<SourceDraft>,
}

impl StageReply {
    /// Parses and validates raw completion text.
    ///
    /// Markdown code fences around the JSON are tolerated; anything else
    /// that deviates from the schema is not.
    ///
    /// # Errors
    ///
    /// Returns `MalformedOutputError` carrying the raw text when the reply
    /// cannot be parsed, has an empty narrative, or cites a source without
    /// a URL.
    pub fn parse(stage: &str, raw: &str) -> Result<Self, MalformedOutputError> {
        let body = strip_code_fence(raw);

        let reply: Self = serde_json::from_str(body)
            .map_err(|e| MalformedOutputError::new(stage, e.to_string(), raw))?;

        if reply.narrative.trim().is_empty() {
            return Err(MalformedOutputError::new(stage, "empty narrative", raw));
        }
        if reply.sources.iter().any(|s| s.url.trim().is_empty()) {
            return Err(MalformedOutputError::new(
                stage,
                "source with empty url",
                raw,
            ));
        }

        Ok(reply)
    }

    /// Converts the reply's citations into source references attributed to
    /// `stage`, defaulting missing access dates to `default_date`.
    #[must_use]
    pub fn into_sources(self, stage: &str, default_date: NaiveDate) -> Vec<SourceReference> {
        self.sources
            .into_iter()
            .map(|draft| SourceReference {
                title: draft.title,
                url: draft.url,
                category: draft.category,
                description: draft.description,
                access_date: draft.access_date.unwrap_or(default_date),
                contributing_stages: vec![stage.to_string()],
                query: draft.query,
            })
            .collect()
    }
}

/// Strips a surrounding Markdown code fence, with or without a language
/// tag.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the language tag line, if present.
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VALID: &str = r#"{
        "narrative": "A mid-size retailer...",
        "sources": [
            {
                "title": "Green Claims Directive",
                "url": "https://eur-lex.example/gcd",
                "category": "regulatory",
                "description": "Directive text",
                "access_date": "2026-08-06",
                "query": "EU green claims directive"
            }
        ]
    }"#;

    #[test]
    fn test_parse_valid_reply() {
        let reply = StageReply::parse("scenario", VALID).unwrap();
        assert_eq!(reply.sources.len(), 1);
        assert_eq!(reply.sources[0].category, SourceCategory::Regulatory);
    }

    #[test]
    fn test_parse_tolerates_code_fence() {
        let fenced = format!("```json\n{VALID}\n```");
        let reply = StageReply::parse("scenario", &fenced).unwrap();
        assert_eq!(reply.sources.len(), 1);
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let err = StageReply::parse("scenario", "I could not comply.").unwrap_err();
        assert_eq!(err.stage, "scenario");
        assert_eq!(err.raw, "I could not comply.");
    }

    #[test]
    fn test_parse_rejects_empty_narrative() {
        let err =
            StageReply::parse("scenario", r#"{"narrative": "  ", "sources": []}"#).unwrap_err();
        assert!(err.message.contains("empty narrative"));
    }

    #[test]
    fn test_parse_rejects_unknown_category() {
        let raw = r#"{
            "narrative": "text",
            "sources": [{"url": "https://a.example", "category": "blog_post"}]
        }"#;
        assert!(StageReply::parse("scenario", raw).is_err());
    }

    #[test]
    fn test_parse_rejects_empty_url() {
        let raw = r#"{
            "narrative": "text",
            "sources": [{"url": " ", "category": "news"}]
        }"#;
        let err = StageReply::parse("scenario", raw).unwrap_err();
        assert!(err.message.contains("empty url"));
    }

    #[test]
    fn test_missing_sources_defaults_to_empty() {
        let reply = StageReply::parse("scenario", r#"{"narrative": "text"}"#).unwrap();
        assert!(reply.sources.is_empty());
    }

    #[test]
    fn test_into_sources_attributes_and_defaults_date() {
        let raw = r#"{
            "narrative": "text",
            "sources": [{"url": "https://a.example", "category": "news"}]
        }"#;
        let reply = StageReply::parse("mistakes", raw).unwrap();

        let default_date = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let sources = reply.into_sources("mistakes", default_date);

        assert_eq!(sources[0].contributing_stages, vec!["mistakes"]);
        assert_eq!(sources[0].access_date, default_date);
    }
}
