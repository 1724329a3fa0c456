//! Error types for the greenbrief pipeline.
//!
//! Every failure aborts the run and carries enough context (stage name,
//! underlying cause) for the caller to report it to the end user. Retries
//! belong to the external collaborators, not to this crate.

use thiserror::Error;

/// The main error type for greenbrief operations.
#[derive(Debug, Error)]
pub enum GreenbriefError {
    /// Pipeline configuration failed validation.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// A stage record was written twice.
    #[error("{0}")]
    DuplicateStage(#[from] DuplicateStageError),

    /// A stage read a dependency it never declared.
    #[error("{0}")]
    UndeclaredDependency(#[from] UndeclaredDependencyError),

    /// A stage's external call failed.
    #[error("{0}")]
    StageExecution(#[from] StageExecutionError),

    /// A stage's reply did not match the expected schema.
    #[error("{0}")]
    MalformedOutput(#[from] MalformedOutputError),

    /// A prompt template referenced an unknown placeholder.
    #[error("{0}")]
    Template(#[from] TemplateError),

    /// Stage definitions could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The run was cancelled between stages.
    #[error("run cancelled: {0}")]
    Cancelled(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error raised when pipeline validation fails.
///
/// Raised at configuration time, before a run starts: missing or duplicate
/// stage names, self-dependencies, cycles, empty pipelines, and prompt
/// templates with unknown placeholders all land here.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }
}

/// Error raised when a cycle is detected in the stage dependency graph.
#[derive(Debug, Clone, Error)]
#[error("cycle detected in pipeline: {}", cycle_path.join(" -> "))]
pub struct CycleDetectedError {
    /// The path of stages forming the cycle.
    pub cycle_path: Vec<String>,
}

impl CycleDetectedError {
    /// Creates a new cycle detected error.
    #[must_use]
    pub fn new(cycle_path: Vec<String>) -> Self {
        Self { cycle_path }
    }
}

impl From<CycleDetectedError> for PipelineValidationError {
    fn from(err: CycleDetectedError) -> Self {
        PipelineValidationError {
            message: err.to_string(),
            stages: err.cycle_path,
        }
    }
}

/// Error raised when a stage record is written a second time.
///
/// Each stage executes exactly once per run, so this indicates a bug in the
/// runner's sequencing rather than a user-facing condition.
#[derive(Debug, Clone, Error)]
#[error("stage '{stage}' already has a record for this run")]
pub struct DuplicateStageError {
    /// The stage name.
    pub stage: String,
}

impl DuplicateStageError {
    /// Creates a new duplicate stage error.
    #[must_use]
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
        }
    }
}

/// Error raised when a stage reads the output of a stage it never declared
/// as a dependency.
#[derive(Debug, Clone, Error)]
#[error("undeclared dependency: stage '{stage}' requested '{requested}' which is not in its dependency list")]
pub struct UndeclaredDependencyError {
    /// The stage attempting the read.
    pub stage: String,
    /// The requested stage name.
    pub requested: String,
}

impl UndeclaredDependencyError {
    /// Creates a new undeclared dependency error.
    #[must_use]
    pub fn new(stage: impl Into<String>, requested: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            requested: requested.into(),
        }
    }
}

/// Failure of one of the external collaborators a stage calls out to.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The text-generation service failed.
    #[error("text generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// The web-search service failed.
    #[error("web search failed: {0}")]
    Search(#[from] SearchError),
}

/// Error raised when a stage's external call fails.
///
/// The run halts and no partial report is returned.
#[derive(Debug, Error)]
#[error("stage '{stage}' failed: {source}")]
pub struct StageExecutionError {
    /// The stage that failed.
    pub stage: String,
    /// The underlying collaborator failure.
    #[source]
    pub source: CollaboratorError,
}

impl StageExecutionError {
    /// Wraps a text-generation failure.
    #[must_use]
    pub fn generation(stage: impl Into<String>, err: GenerationError) -> Self {
        Self {
            stage: stage.into(),
            source: CollaboratorError::Generation(err),
        }
    }

    /// Wraps a web-search failure.
    #[must_use]
    pub fn search(stage: impl Into<String>, err: SearchError) -> Self {
        Self {
            stage: stage.into(),
            source: CollaboratorError::Search(err),
        }
    }
}

/// Error raised when a stage reply fails schema validation.
///
/// Non-retryable from this crate's perspective. The raw text is kept for
/// diagnostics.
#[derive(Debug, Clone, Error)]
#[error("stage '{stage}' returned a malformed reply: {message}")]
pub struct MalformedOutputError {
    /// The stage whose reply failed validation.
    pub stage: String,
    /// What was wrong with the reply.
    pub message: String,
    /// The raw reply text.
    pub raw: String,
}

impl MalformedOutputError {
    /// Creates a new malformed output error.
    #[must_use]
    pub fn new(
        stage: impl Into<String>,
        message: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// Returns the first 256 characters of the raw reply for log lines.
    #[must_use]
    pub fn raw_excerpt(&self) -> &str {
        let end = self
            .raw
            .char_indices()
            .nth(256)
            .map_or(self.raw.len(), |(i, _)| i);
        &self.raw[..end]
    }
}

/// Error raised when a prompt template references an unknown placeholder.
#[derive(Debug, Clone, Error)]
#[error("unknown placeholder '{{{placeholder}}}' in prompt template")]
pub struct TemplateError {
    /// The placeholder name.
    pub placeholder: String,
}

impl TemplateError {
    /// Creates a new template error.
    #[must_use]
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
        }
    }
}

/// Errors loading stage definitions.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The definition file could not be read.
    #[error("failed to read stage definitions: {0}")]
    Io(#[from] std::io::Error),

    /// The definition file could not be parsed.
    #[error("failed to parse stage definitions: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The definition file contains no stages.
    #[error("stage definitions contain no stages")]
    NoStages,
}

/// Errors from the text-generation collaborator.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// Transport-level failure.
    #[error("transport error: {0}")]
    Http(String),

    /// The service returned a non-success status.
    #[error("service returned status {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or status message.
        message: String,
    },

    /// The service rate-limited the request.
    #[error("rate limited")]
    RateLimited,

    /// The call exceeded its deadline.
    #[error("timed out after {seconds}s")]
    Timeout {
        /// The configured timeout in seconds.
        seconds: f64,
    },

    /// No API key was configured.
    #[error("no API key configured")]
    MissingApiKey,

    /// The service returned an empty completion.
    #[error("empty completion")]
    Empty,
}

/// Errors from the web-search collaborator.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// Transport-level failure.
    #[error("transport error: {0}")]
    Http(String),

    /// The service returned a non-success status.
    #[error("service returned status {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or status message.
        message: String,
    },

    /// No API key was configured.
    #[error("no API key configured")]
    MissingApiKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_message() {
        let err = PipelineValidationError::new("bad pipeline")
            .with_stages(vec!["a".to_string(), "b".to_string()]);

        assert_eq!(err.to_string(), "bad pipeline");
        assert_eq!(err.stages.len(), 2);
    }

    #[test]
    fn test_cycle_detected_error() {
        let err = CycleDetectedError::new(vec![
            "a".to_string(),
            "b".to_string(),
            "a".to_string(),
        ]);

        assert!(err.to_string().contains("a -> b -> a"));

        let validation: PipelineValidationError = err.into();
        assert_eq!(validation.stages, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_undeclared_dependency_error() {
        let err = UndeclaredDependencyError::new("assessment", "scenario");
        assert!(err.to_string().contains("assessment"));
        assert!(err.to_string().contains("scenario"));
    }

    #[test]
    fn test_stage_execution_error_names_stage() {
        let err = StageExecutionError::generation("mistakes", GenerationError::RateLimited);
        assert!(err.to_string().contains("mistakes"));
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_malformed_output_excerpt() {
        let raw = "x".repeat(1000);
        let err = MalformedOutputError::new("scenario", "not JSON", raw);

        assert_eq!(err.raw_excerpt().len(), 256);
        assert_eq!(err.raw.len(), 1000);
    }

    #[test]
    fn test_template_error_braces() {
        let err = TemplateError::new("user_industry");
        assert!(err.to_string().contains("{user_industry}"));
    }

    #[test]
    fn test_top_level_conversions() {
        let err: GreenbriefError = DuplicateStageError::new("scenario").into();
        assert!(matches!(err, GreenbriefError::DuplicateStage(_)));

        let err: GreenbriefError =
            StageExecutionError::search("scenario", SearchError::MissingApiKey).into();
        assert!(matches!(err, GreenbriefError::StageExecution(_)));
    }
}
