//! Final report assembly.
//!
//! A pure function over the training report: same input, byte-identical
//! output. No external calls, no clocks.

use crate::model::{SourceCategory, SourceReference, TrainingReport};
use std::fmt::Write as _;

/// Renders the training report as a human-readable Markdown document.
///
/// Sections appear in pipeline order, followed by a Sources section
/// grouped by category.
#[must_use]
pub fn assemble(report: &TrainingReport) -> String {
    let mut doc = String::new();

    let _ = writeln!(doc, "# Sustainability Messaging Training Report");
    let _ = writeln!(doc);
    let _ = writeln!(doc, "Session: {}", report.session_id);
    let _ = writeln!(
        doc,
        "Date: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    for record in &report.stages {
        let _ = writeln!(doc);
        let _ = writeln!(doc, "## {}", record.title);
        let _ = writeln!(doc);
        let _ = writeln!(doc, "{}", record.narrative.trim_end());
    }

    if !report.sources.is_empty() {
        let _ = writeln!(doc);
        let _ = writeln!(doc, "## Sources");

        for category in SourceCategory::ALL {
            let entries: Vec<&SourceReference> = report
                .sources
                .iter()
                .filter(|s| s.category == category)
                .collect();
            if entries.is_empty() {
                continue;
            }

            let _ = writeln!(doc);
            let _ = writeln!(doc, "### {}", category.label());
            let _ = writeln!(doc);
            for source in entries {
                let _ = writeln!(doc, "{}", render_source(source));
            }
        }
    }

    doc
}

fn render_source(source: &SourceReference) -> String {
    format!(
        "- {} - {} (accessed {}) — used by: {}",
        source.title,
        source.url,
        source.access_date.format("%Y-%m-%d"),
        source.contributing_stages.join(", ")
    )
}
