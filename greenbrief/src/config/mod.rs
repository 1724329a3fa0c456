//! Run configuration: stage definitions and global parameters.
//!
//! Stage definitions live in YAML, matching how the original training
//! content was authored; a built-in four-stage chain ships with the crate.

pub mod template;

pub use template::{placeholders, render};

use crate::errors::ConfigError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// The built-in stage definitions.
const BUILTIN_STAGES: &str = include_str!("../../config/stages.yaml");

/// Fallback learner profile used when the caller supplies none.
pub const DEFAULT_USER_PROFILE: &str = "\
Name: Marketing Professional
Role: Marketing Director
Company type: Marketing/Communications Agency
Experience level: Intermediate
Training goal: Build team capability in sustainability messaging compliance";

/// One stage definition as authored in YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Unique stage name.
    pub name: String,
    /// Display title used as the report section heading.
    pub title: String,
    /// Prompt template with `{placeholder}` markers.
    pub description: String,
    /// Names of prior stages whose narratives feed this stage's prompt.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Search query templates run before generation.
    #[serde(default)]
    pub queries: Vec<String>,
}

/// An ordered list of stage definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name.
    pub name: String,
    /// Stage definitions in declaration order.
    pub stages: Vec<StageConfig>,
}

impl PipelineConfig {
    /// Parses a YAML definition string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the YAML is invalid or defines no stages.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        if config.stages.is_empty() {
            return Err(ConfigError::NoStages);
        }
        Ok(config)
    }

    /// Loads a YAML definition file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// The built-in four-stage training chain.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the embedded definitions fail to parse,
    /// which indicates a packaging defect.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml_str(BUILTIN_STAGES)
    }

    /// Stage names in declaration order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Global parameters substituted into every stage's prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalParams {
    /// Industry the training targets.
    pub industry: String,
    /// Regulatory frame the training teaches against.
    pub regulations: String,
    /// Current year, as text for prompt substitution.
    pub current_year: String,
    /// Session identifier.
    pub session_id: String,
    /// Learner profile text.
    pub user_profile: String,
}

impl GlobalParams {
    /// Placeholder names stages may reference.
    pub const NAMES: [&'static str; 5] = [
        "user_industry",
        "regional_regulations",
        "current_year",
        "session_id",
        "user_profile",
    ];

    /// Creates parameters for an industry and regulation set, with a
    /// generated session id, the current year, and the default learner
    /// profile.
    #[must_use]
    pub fn new(industry: impl Into<String>, regulations: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            industry: industry.into(),
            regulations: regulations.into(),
            current_year: now.format("%Y").to_string(),
            session_id: format!("TRAIN_{}", now.format("%Y%m%d_%H%M%S")),
            user_profile: DEFAULT_USER_PROFILE.to_string(),
        }
    }

    /// Overrides the learner profile.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.user_profile = profile.into();
        self
    }

    /// Overrides the session id.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Overrides the current year.
    #[must_use]
    pub fn with_current_year(mut self, year: impl Into<String>) -> Self {
        self.current_year = year.into();
        self
    }

    /// The substitution map for template rendering.
    #[must_use]
    pub fn vars(&self) -> HashMap<String, String> {
        HashMap::from([
            ("user_industry".to_string(), self.industry.clone()),
            ("regional_regulations".to_string(), self.regulations.clone()),
            ("current_year".to_string(), self.current_year.clone()),
            ("session_id".to_string(), self.session_id.clone()),
            ("user_profile".to_string(), self.user_profile.clone()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_config_parses() {
        let config = PipelineConfig::builtin().unwrap();
        assert_eq!(config.name, "sustainability_training");
        assert_eq!(
            config.stage_names(),
            vec![
                "scenario_creation",
                "mistake_generation",
                "best_practice_transformation",
                "assessment_and_feedback",
            ]
        );
    }

    #[test]
    fn test_builtin_dependencies_form_a_chain_prefix() {
        let config = PipelineConfig::builtin().unwrap();

        for (i, stage) in config.stages.iter().enumerate() {
            let earlier: Vec<_> = config.stages[..i].iter().map(|s| &s.name).collect();
            for dep in &stage.dependencies {
                assert!(earlier.contains(&dep), "{} -> {dep}", stage.name);
            }
        }
    }

    #[test]
    fn test_builtin_placeholders_are_known() {
        let config = PipelineConfig::builtin().unwrap();

        for stage in &config.stages {
            for found in placeholders(&stage.description) {
                assert!(
                    GlobalParams::NAMES.contains(&found.as_str()),
                    "unknown placeholder {found} in {}",
                    stage.name
                );
            }
            for query in &stage.queries {
                for found in placeholders(query) {
                    assert!(GlobalParams::NAMES.contains(&found.as_str()));
                }
            }
        }
    }

    #[test]
    fn test_from_yaml_rejects_empty() {
        let err = PipelineConfig::from_yaml_str("name: empty\nstages: []").unwrap_err();
        assert!(matches!(err, ConfigError::NoStages));
    }

    #[test]
    fn test_from_yaml_rejects_garbage() {
        assert!(PipelineConfig::from_yaml_str(": not yaml [").is_err());
    }

    #[test]
    fn test_global_params_defaults() {
        let params = GlobalParams::new("Retail", "EU Green Claims Directive");

        assert!(params.session_id.starts_with("TRAIN_"));
        assert_eq!(params.user_profile, DEFAULT_USER_PROFILE);

        let vars = params.vars();
        assert_eq!(vars.len(), GlobalParams::NAMES.len());
        assert_eq!(vars["user_industry"], "Retail");
    }

    #[test]
    fn test_global_params_overrides() {
        let params = GlobalParams::new("Tech", "CSRD")
            .with_session_id("TRAIN_TEST")
            .with_current_year("2026")
            .with_profile("Role: CMO");

        let vars = params.vars();
        assert_eq!(vars["session_id"], "TRAIN_TEST");
        assert_eq!(vars["current_year"], "2026");
        assert_eq!(vars["user_profile"], "Role: CMO");
    }
}
