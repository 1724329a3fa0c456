//! Stage specifications.

use crate::config::StageConfig;
use crate::errors::PipelineValidationError;

/// Runtime specification for a single stage.
///
/// Immutable after configuration load. Dependencies are ordered: their
/// narratives appear in the prompt in declaration order.
#[derive(Debug, Clone)]
pub struct StageSpec {
    /// Unique stage name.
    pub name: String,
    /// Display title used as the report section heading.
    pub title: String,
    /// Prompt template with `{placeholder}` markers.
    pub instructions: String,
    /// Prior stages whose narratives feed this stage's prompt.
    pub dependencies: Vec<String>,
    /// Search query templates run before generation.
    pub queries: Vec<String>,
}

impl StageSpec {
    /// Creates a stage spec with no dependencies or queries.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            instructions: instructions.into(),
            dependencies: Vec::new(),
            queries: Vec::new(),
        }
    }

    /// Sets the dependencies.
    #[must_use]
    pub fn with_dependencies(
        mut self,
        deps: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a dependency.
    #[must_use]
    pub fn with_dependency(mut self, dep: impl Into<String>) -> Self {
        self.dependencies.push(dep.into());
        self
    }

    /// Sets the search queries.
    #[must_use]
    pub fn with_queries(
        mut self,
        queries: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.queries = queries.into_iter().map(Into::into).collect();
        self
    }

    /// Validates the stage specification.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or the stage depends on
    /// itself.
    pub fn validate(&self) -> Result<(), PipelineValidationError> {
        if self.name.trim().is_empty() {
            return Err(PipelineValidationError::new("stage name cannot be empty"));
        }
        if self.dependencies.iter().any(|d| d == &self.name) {
            return Err(PipelineValidationError::new(format!(
                "stage '{}' cannot depend on itself",
                self.name
            ))
            .with_stages(vec![self.name.clone()]));
        }
        Ok(())
    }
}

impl From<StageConfig> for StageSpec {
    fn from(config: StageConfig) -> Self {
        Self {
            name: config.name,
            title: config.title,
            instructions: config.description,
            dependencies: config.dependencies,
            queries: config.queries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builders() {
        let spec = StageSpec::new("mistakes", "Problematic Messages", "Write {user_industry}...")
            .with_dependency("scenario")
            .with_queries(["greenwashing fines"]);

        assert_eq!(spec.dependencies, vec!["scenario"]);
        assert_eq!(spec.queries.len(), 1);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_self_dependency_rejected() {
        let spec = StageSpec::new("a", "A", "text").with_dependency("a");
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        let spec = StageSpec::new("  ", "A", "text");
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_from_stage_config() {
        let config = StageConfig {
            name: "scenario_creation".to_string(),
            title: "Business Scenario".to_string(),
            description: "Create a scenario for {user_industry}".to_string(),
            dependencies: vec![],
            queries: vec!["{user_industry} trends".to_string()],
        };

        let spec = StageSpec::from(config);
        assert_eq!(spec.name, "scenario_creation");
        assert_eq!(spec.queries, vec!["{user_industry} trends"]);
    }
}
