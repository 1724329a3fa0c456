//! Report export.
//!
//! Writes the assembled document and the structured report to an output
//! directory, creating it on demand. Destinations beyond the local
//! filesystem are the caller's concern.

use crate::errors::GreenbriefError;
use crate::model::TrainingReport;
use crate::report;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes training reports into a directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    /// Creates a writer for the given directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the assembled document as `training_report_{timestamp}.txt`.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the directory cannot be created or the file
    /// cannot be written.
    pub fn write_text(&self, report: &TrainingReport) -> Result<PathBuf, GreenbriefError> {
        fs::create_dir_all(&self.dir)?;

        let path = self
            .dir
            .join(format!("training_report_{}.txt", self.timestamp(report)));
        fs::write(&path, report::assemble(report))?;

        tracing::info!(path = %path.display(), session = %report.session_id, "report written");
        Ok(path)
    }

    /// Writes the structured report as `structured_data_{timestamp}.json`.
    ///
    /// # Errors
    ///
    /// Returns an IO error on filesystem failure, or a serialization error
    /// if the report cannot be encoded.
    pub fn write_json(&self, report: &TrainingReport) -> Result<PathBuf, GreenbriefError> {
        fs::create_dir_all(&self.dir)?;

        let path = self
            .dir
            .join(format!("structured_data_{}.json", self.timestamp(report)));
        fs::write(&path, serde_json::to_string_pretty(report)?)?;

        tracing::info!(path = %path.display(), session = %report.session_id, "structured data written");
        Ok(path)
    }

    fn timestamp(&self, report: &TrainingReport) -> String {
        report.generated_at.format("%Y%m%d_%H%M%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StageRecord;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn sample_report() -> TrainingReport {
        TrainingReport {
            session_id: "TRAIN_TEST".to_string(),
            run_id: Uuid::nil(),
            generated_at: Utc.with_ymd_and_hms(2026, 8, 6, 9, 30, 0).unwrap(),
            stages: vec![StageRecord::new(
                "scenario",
                "Business Scenario",
                "A retailer.",
                Vec::new(),
            )],
            sources: Vec::new(),
        }
    }

    #[test]
    fn test_write_text_creates_directory_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(tmp.path().join("outputs"));

        let path = writer.write_text(&sample_report()).unwrap();
        assert!(path.ends_with("training_report_20260806_093000.txt"));

        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("Session: TRAIN_TEST"));
        assert!(contents.contains("## Business Scenario"));
    }

    #[test]
    fn test_write_json_roundtrips() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(tmp.path());

        let path = writer.write_json(&sample_report()).unwrap();
        let contents = fs::read_to_string(path).unwrap();
        let parsed: TrainingReport = serde_json::from_str(&contents).unwrap();

        assert_eq!(parsed.session_id, "TRAIN_TEST");
        assert_eq!(parsed.stages.len(), 1);
    }
}
