//! Run progress events.
//!
//! The runner emits typed events so a front end can render progress
//! ("stage 2 of 4...") without being wired into the pipeline itself.

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

/// An event emitted during a pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// A run began.
    RunStarted {
        /// Session identifier.
        session_id: String,
        /// Number of stages that will execute.
        stage_count: usize,
    },
    /// A stage began executing.
    StageStarted {
        /// Stage name.
        stage: String,
        /// 1-based position in the pipeline.
        index: usize,
        /// Total stage count.
        total: usize,
    },
    /// A stage's web search returned.
    SearchPerformed {
        /// Stage name.
        stage: String,
        /// The query that was searched.
        query: String,
        /// Number of hits returned.
        hits: usize,
    },
    /// A stage finished successfully.
    StageCompleted {
        /// Stage name.
        stage: String,
        /// Wall-clock duration in milliseconds.
        duration_ms: f64,
        /// Number of sources the stage cited.
        source_count: usize,
    },
    /// A stage failed; the run halts.
    StageFailed {
        /// Stage name.
        stage: String,
        /// Error message.
        error: String,
    },
    /// The run finished and a report was produced.
    RunCompleted {
        /// Session identifier.
        session_id: String,
        /// Number of deduplicated sources in the report.
        source_count: usize,
    },
    /// The run was cancelled between stages.
    RunCancelled {
        /// Cancellation reason.
        reason: String,
    },
}

/// Receiver for run events.
///
/// `try_emit` must never fail or panic; sinks swallow their own errors.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    async fn emit(&self, event: RunEvent);

    /// Emits an event without blocking.
    fn try_emit(&self, event: &RunEvent);
}

/// Discards all events. The default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: RunEvent) {}

    fn try_emit(&self, _event: &RunEvent) {}
}

/// Logs events through the tracing framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventSink;

impl LoggingEventSink {
    /// Creates a new logging sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn log(event: &RunEvent) {
        match event {
            RunEvent::RunStarted {
                session_id,
                stage_count,
            } => {
                info!(session = %session_id, stages = stage_count, "training run started");
            }
            RunEvent::StageStarted {
                stage,
                index,
                total,
            } => {
                info!(stage = %stage, "stage {index} of {total} started");
            }
            RunEvent::SearchPerformed { stage, query, hits } => {
                info!(stage = %stage, query = %query, hits, "search performed");
            }
            RunEvent::StageCompleted {
                stage,
                duration_ms,
                source_count,
            } => {
                info!(stage = %stage, duration_ms, sources = source_count, "stage completed");
            }
            RunEvent::StageFailed { stage, error } => {
                info!(stage = %stage, error = %error, "stage failed");
            }
            RunEvent::RunCompleted {
                session_id,
                source_count,
            } => {
                info!(session = %session_id, sources = source_count, "training run completed");
            }
            RunEvent::RunCancelled { reason } => {
                info!(reason = %reason, "training run cancelled");
            }
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: RunEvent) {
        Self::log(&event);
    }

    fn try_emit(&self, event: &RunEvent) {
        Self::log(event);
    }
}

/// Collects events in memory, for tests.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<RunEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Names of stages that completed, in completion order.
    #[must_use]
    pub fn completed_stages(&self) -> Vec<String> {
        self.events
            .read()
            .iter()
            .filter_map(|e| match e {
                RunEvent::StageCompleted { stage, .. } => Some(stage.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: RunEvent) {
        self.events.write().push(event);
    }

    fn try_emit(&self, event: &RunEvent) {
        self.events.write().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_sink() {
        let sink = NoOpEventSink;
        sink.emit(RunEvent::RunCancelled {
            reason: "test".to_string(),
        })
        .await;
        sink.try_emit(&RunEvent::RunCancelled {
            reason: "test".to_string(),
        });
    }

    #[tokio::test]
    async fn test_collecting_sink_records_order() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.try_emit(&RunEvent::StageCompleted {
            stage: "scenario".to_string(),
            duration_ms: 12.0,
            source_count: 2,
        });
        sink.emit(RunEvent::StageCompleted {
            stage: "mistakes".to_string(),
            duration_ms: 8.0,
            source_count: 1,
        })
        .await;

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.completed_stages(), vec!["scenario", "mistakes"]);
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_value(RunEvent::StageStarted {
            stage: "scenario".to_string(),
            index: 1,
            total: 4,
        })
        .unwrap();

        assert_eq!(json["type"], "stage_started");
        assert_eq!(json["stage"], "scenario");
    }
}
