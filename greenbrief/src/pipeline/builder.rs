//! Pipeline builder with configuration-time validation.
//!
//! Everything that can fail before a run starts fails here: duplicate or
//! self-referencing stages, dependencies on stages that are not declared
//! earlier, cycles, unknown prompt placeholders, and empty pipelines.

use super::StageSpec;
use crate::config::{self, GlobalParams, PipelineConfig};
use crate::errors::{CycleDetectedError, PipelineValidationError};
use std::collections::{HashMap, HashSet};

/// A validated, ordered set of stages ready to run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    specs: Vec<StageSpec>,
}

impl Pipeline {
    /// The pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stage specs in execution order.
    #[must_use]
    pub fn specs(&self) -> &[StageSpec] {
        &self.specs
    }

    /// The number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.specs.len()
    }

    /// Stage names in execution order.
    #[must_use]
    pub fn execution_order(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Builder for creating validated pipelines.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    name: String,
    specs: Vec<StageSpec>,
    names: HashSet<String>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            specs: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Builds a pipeline directly from loaded stage definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage definition fails validation.
    pub fn from_config(config: PipelineConfig) -> Result<Pipeline, PipelineValidationError> {
        let mut builder = Self::new(config.name);
        for stage in config.stages {
            builder.add_spec(StageSpec::from(stage))?;
        }
        builder.build()
    }

    /// Adds a stage, consuming and returning the builder.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn stage(mut self, spec: StageSpec) -> Result<Self, PipelineValidationError> {
        self.add_spec(spec)?;
        Ok(self)
    }

    /// Adds a stage specification.
    ///
    /// Dependencies must reference stages added earlier, which keeps the
    /// declaration order a valid execution order for any dependency DAG.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn add_spec(&mut self, spec: StageSpec) -> Result<(), PipelineValidationError> {
        spec.validate()?;

        if self.names.contains(&spec.name) {
            return Err(PipelineValidationError::new(format!(
                "duplicate stage name '{}'",
                spec.name
            ))
            .with_stages(vec![spec.name.clone()]));
        }

        for dep in &spec.dependencies {
            if !self.names.contains(dep) {
                return Err(PipelineValidationError::new(format!(
                    "stage '{}' depends on unknown stage '{}'; dependencies must be declared earlier",
                    spec.name, dep
                ))
                .with_stages(vec![spec.name.clone(), dep.clone()]));
            }
        }

        self.validate_placeholders(&spec)?;

        self.names.insert(spec.name.clone());
        self.specs.push(spec);

        self.detect_cycles()?;
        Ok(())
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the builder has no stages.
    pub fn build(self) -> Result<Pipeline, PipelineValidationError> {
        if self.specs.is_empty() {
            return Err(PipelineValidationError::new("pipeline has no stages"));
        }

        Ok(Pipeline {
            name: self.name,
            specs: self.specs,
        })
    }

    /// The pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of stages added so far.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.specs.len()
    }

    /// Prompt and query templates may only reference global parameters;
    /// anything else is a typo caught before the first run.
    fn validate_placeholders(&self, spec: &StageSpec) -> Result<(), PipelineValidationError> {
        let templates = std::iter::once(&spec.instructions).chain(spec.queries.iter());

        for template in templates {
            for placeholder in config::placeholders(template) {
                if !GlobalParams::NAMES.contains(&placeholder.as_str()) {
                    return Err(PipelineValidationError::new(format!(
                        "stage '{}' references unknown placeholder '{{{placeholder}}}'",
                        spec.name
                    ))
                    .with_stages(vec![spec.name.clone()]));
                }
            }
        }
        Ok(())
    }

    fn detect_cycles(&self) -> Result<(), CycleDetectedError> {
        let by_name: HashMap<&str, &StageSpec> =
            self.specs.iter().map(|s| (s.name.as_str(), s)).collect();

        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for spec in &self.specs {
            if !visited.contains(spec.name.as_str()) {
                if let Some(cycle) =
                    dfs_cycle(&spec.name, &by_name, &mut visited, &mut rec_stack, &mut path)
                {
                    return Err(CycleDetectedError::new(cycle));
                }
            }
        }
        Ok(())
    }
}

fn dfs_cycle(
    node: &str,
    by_name: &HashMap<&str, &StageSpec>,
    visited: &mut HashSet<String>,
    rec_stack: &mut HashSet<String>,
    path: &mut Vec<String>,
) -> Option<Vec<String>> {
    visited.insert(node.to_string());
    rec_stack.insert(node.to_string());
    path.push(node.to_string());

    if let Some(spec) = by_name.get(node) {
        for dep in &spec.dependencies {
            if !visited.contains(dep.as_str()) {
                if let Some(cycle) = dfs_cycle(dep, by_name, visited, rec_stack, path) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(dep.as_str()) {
                let cycle_start = path.iter().position(|n| n == dep)?;
                let mut cycle: Vec<String> = path[cycle_start..].to_vec();
                cycle.push(dep.clone());
                return Some(cycle);
            }
        }
    }

    path.pop();
    rec_stack.remove(node);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, deps: &[&str]) -> StageSpec {
        StageSpec::new(name, name.to_uppercase(), format!("{name} prompt"))
            .with_dependencies(deps.iter().copied())
    }

    #[test]
    fn test_chain_builds() {
        let pipeline = PipelineBuilder::new("test")
            .stage(spec("a", &[]))
            .unwrap()
            .stage(spec("b", &["a"]))
            .unwrap()
            .stage(spec("c", &["b"]))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(pipeline.execution_order(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dag_with_fan_in_builds() {
        let pipeline = PipelineBuilder::new("test")
            .stage(spec("a", &[]))
            .unwrap()
            .stage(spec("b", &["a"]))
            .unwrap()
            .stage(spec("c", &["a", "b"]))
            .unwrap()
            .build()
            .unwrap();

        let order = pipeline.execution_order();
        for dep in &pipeline.specs()[2].dependencies {
            let dep_pos = order.iter().position(|n| *n == dep.as_str()).unwrap();
            assert!(dep_pos < 2);
        }
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let err = PipelineBuilder::new("test")
            .stage(spec("b", &["missing"]))
            .unwrap_err();

        assert!(err.message.contains("unknown stage 'missing'"));
        assert_eq!(err.stages, vec!["b", "missing"]);
    }

    #[test]
    fn test_forward_dependency_rejected() {
        // Declaration order must already be topological.
        let mut builder = PipelineBuilder::new("test");
        let err = builder.add_spec(spec("a", &["b"])).unwrap_err();
        assert!(err.message.contains("declared earlier"));
    }

    #[test]
    fn test_duplicate_stage_name_rejected() {
        let err = PipelineBuilder::new("test")
            .stage(spec("a", &[]))
            .unwrap()
            .stage(spec("a", &[]))
            .unwrap_err();

        assert!(err.message.contains("duplicate stage name"));
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let bad = StageSpec::new("a", "A", "Hello {no_such_param}");
        let err = PipelineBuilder::new("test").stage(bad).unwrap_err();

        assert!(err.message.contains("{no_such_param}"));
    }

    #[test]
    fn test_unknown_placeholder_in_query_rejected() {
        let bad = StageSpec::new("a", "A", "fine").with_queries(["{typo} trends"]);
        assert!(PipelineBuilder::new("test").stage(bad).is_err());
    }

    #[test]
    fn test_empty_build_rejected() {
        assert!(PipelineBuilder::new("test").build().is_err());
    }

    #[test]
    fn test_builtin_config_builds() {
        let config = crate::config::PipelineConfig::builtin().unwrap();
        let pipeline = PipelineBuilder::from_config(config).unwrap();

        assert_eq!(pipeline.stage_count(), 4);
        assert_eq!(pipeline.name(), "sustainability_training");
    }
}
