//! Per-run context accumulator.
//!
//! Write-once-per-stage for the runner, read-only for prompt assembly.
//! Scoped to a single pipeline run; concurrent runs each get their own
//! instance and share nothing.

use crate::errors::{DuplicateStageError, UndeclaredDependencyError};
use crate::model::StageRecord;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Growing map from stage name to stage record.
///
/// Insertion order is preserved so the final report lists stages in
/// pipeline order.
#[derive(Debug, Default)]
pub struct ContextAccumulator {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    records: Vec<Arc<StageRecord>>,
    by_name: HashMap<String, usize>,
}

impl ContextAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a stage record.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateStageError` if the stage already has a record;
    /// each stage executes exactly once per run.
    pub fn insert(&self, record: StageRecord) -> Result<(), DuplicateStageError> {
        let mut inner = self.inner.write();

        if inner.by_name.contains_key(&record.stage) {
            return Err(DuplicateStageError::new(&record.stage));
        }

        let index = inner.records.len();
        inner.by_name.insert(record.stage.clone(), index);
        inner.records.push(Arc::new(record));
        Ok(())
    }

    /// Looks up a stage record by name.
    #[must_use]
    pub fn get(&self, stage: &str) -> Option<Arc<StageRecord>> {
        let inner = self.inner.read();
        inner.by_name.get(stage).map(|&i| inner.records[i].clone())
    }

    /// Returns true if the stage has a record.
    #[must_use]
    pub fn contains(&self, stage: &str) -> bool {
        self.inner.read().by_name.contains_key(stage)
    }

    /// Returns all records in insertion order.
    #[must_use]
    pub fn records(&self) -> Vec<Arc<StageRecord>> {
        self.inner.read().records.clone()
    }

    /// Returns the number of completed stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Returns true if no stage has completed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    /// Builds the read view for one stage, restricted to its declared
    /// dependencies.
    #[must_use]
    pub fn view_for<'a>(&'a self, stage: &str, declared: &[String]) -> DependencyView<'a> {
        DependencyView {
            accumulator: self,
            stage: stage.to_string(),
            declared: declared.to_vec(),
        }
    }
}

/// Read view of prior stage outputs for one executing stage.
///
/// Reading a stage outside the declared dependency list is a programming
/// error, not a recoverable runtime condition; the builder also rejects
/// such configurations before a run starts.
#[derive(Debug)]
pub struct DependencyView<'a> {
    accumulator: &'a ContextAccumulator,
    stage: String,
    declared: Vec<String>,
}

impl DependencyView<'_> {
    /// Reads a declared dependency's record.
    ///
    /// # Errors
    ///
    /// Returns `UndeclaredDependencyError` if `dependency` is not in the
    /// declared list or has not completed in the current run.
    pub fn get(&self, dependency: &str) -> Result<Arc<StageRecord>, UndeclaredDependencyError> {
        if !self.declared.iter().any(|d| d == dependency) {
            return Err(UndeclaredDependencyError::new(&self.stage, dependency));
        }

        self.accumulator
            .get(dependency)
            .ok_or_else(|| UndeclaredDependencyError::new(&self.stage, dependency))
    }

    /// The declared dependencies, in declaration order.
    #[must_use]
    pub fn declared(&self) -> &[String] {
        &self.declared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(stage: &str) -> StageRecord {
        StageRecord::new(stage, stage.to_uppercase(), format!("{stage} narrative"), Vec::new())
    }

    #[test]
    fn test_insert_and_get() {
        let acc = ContextAccumulator::new();
        acc.insert(record("scenario")).unwrap();

        let fetched = acc.get("scenario").unwrap();
        assert_eq!(fetched.narrative, "scenario narrative");
        assert!(acc.contains("scenario"));
        assert!(!acc.contains("mistakes"));
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let acc = ContextAccumulator::new();
        acc.insert(record("scenario")).unwrap();

        let err = acc.insert(record("scenario")).unwrap_err();
        assert_eq!(err.stage, "scenario");
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn test_records_keep_insertion_order() {
        let acc = ContextAccumulator::new();
        acc.insert(record("scenario")).unwrap();
        acc.insert(record("mistakes")).unwrap();
        acc.insert(record("corrections")).unwrap();

        let names: Vec<_> = acc.records().iter().map(|r| r.stage.clone()).collect();
        assert_eq!(names, vec!["scenario", "mistakes", "corrections"]);
    }

    #[test]
    fn test_view_declared_dependency() {
        let acc = ContextAccumulator::new();
        acc.insert(record("scenario")).unwrap();

        let view = acc.view_for("mistakes", &["scenario".to_string()]);
        assert!(view.get("scenario").is_ok());
    }

    #[test]
    fn test_view_undeclared_dependency() {
        let acc = ContextAccumulator::new();
        acc.insert(record("scenario")).unwrap();
        acc.insert(record("mistakes")).unwrap();

        let view = acc.view_for("corrections", &["mistakes".to_string()]);
        let err = view.get("scenario").unwrap_err();

        assert_eq!(err.stage, "corrections");
        assert_eq!(err.requested, "scenario");
    }

    #[test]
    fn test_view_declared_but_unexecuted() {
        let acc = ContextAccumulator::new();

        // Declared in config but never run: still an error, never a
        // partial read.
        let view = acc.view_for("mistakes", &["scenario".to_string()]);
        assert!(view.get("scenario").is_err());
    }

    #[test]
    fn test_empty_accumulator() {
        let acc = ContextAccumulator::new();
        assert!(acc.is_empty());
        assert_eq!(acc.len(), 0);
        assert!(acc.get("anything").is_none());
    }
}
