//! Sequential stage execution.
//!
//! Stages run strictly in declared order: each prompt embeds the rendered
//! narratives of its declared dependencies, so there is nothing to run in
//! parallel within one pipeline. The only concurrency is the fan-out of a
//! single stage's search queries.

use super::{Pipeline, StageSpec};
use crate::cancel::CancellationToken;
use crate::config::{template, GlobalParams};
use crate::context::ContextAccumulator;
use crate::errors::{GreenbriefError, StageExecutionError};
use crate::events::{EventSink, NoOpEventSink, RunEvent};
use crate::llm::{GenerationRequest, Generator, StageReply};
use crate::model::{StageRecord, TrainingReport};
use crate::search::{format_hits, SearchProvider};
use crate::sources;
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Executes a pipeline against the configured collaborators.
pub struct StageRunner {
    generator: Arc<dyn Generator>,
    search: Option<Arc<dyn SearchProvider>>,
    sink: Arc<dyn EventSink>,
    cancellation: CancellationToken,
}

impl StageRunner {
    /// Creates a runner with no search provider, a no-op event sink, and a
    /// fresh cancellation token.
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            search: None,
            sink: Arc::new(NoOpEventSink),
            cancellation: CancellationToken::new(),
        }
    }

    /// Sets the search provider.
    #[must_use]
    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Shares a cancellation token with the caller.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Runs every stage in order and assembles the training report.
    ///
    /// Fails fast: the first collaborator failure or malformed reply
    /// aborts the run with no partial report. Cancellation is honored
    /// between stages.
    ///
    /// # Errors
    ///
    /// Returns `StageExecutionError` when an external call fails,
    /// `MalformedOutputError` when a reply fails schema validation, and
    /// `Cancelled` when the token was triggered between stages.
    pub async fn run(
        &self,
        pipeline: &Pipeline,
        params: &GlobalParams,
    ) -> Result<TrainingReport, GreenbriefError> {
        let vars = params.vars();
        let accumulator = ContextAccumulator::new();
        let total = pipeline.stage_count();

        self.sink.try_emit(&RunEvent::RunStarted {
            session_id: params.session_id.clone(),
            stage_count: total,
        });

        for (index, spec) in pipeline.specs().iter().enumerate() {
            if self.cancellation.is_cancelled() {
                let reason = self
                    .cancellation
                    .reason()
                    .unwrap_or_else(|| "cancelled".to_string());
                self.sink.try_emit(&RunEvent::RunCancelled {
                    reason: reason.clone(),
                });
                return Err(GreenbriefError::Cancelled(reason));
            }

            self.sink.try_emit(&RunEvent::StageStarted {
                stage: spec.name.clone(),
                index: index + 1,
                total,
            });
            let started = Instant::now();

            match self.execute_stage(spec, &vars, &accumulator).await {
                Ok(record) => {
                    self.sink.try_emit(&RunEvent::StageCompleted {
                        stage: spec.name.clone(),
                        duration_ms: started.elapsed().as_secs_f64() * 1000.0,
                        source_count: record.sources.len(),
                    });
                    accumulator.insert(record)?;
                }
                Err(err) => {
                    self.sink.try_emit(&RunEvent::StageFailed {
                        stage: spec.name.clone(),
                        error: err.to_string(),
                    });
                    return Err(err);
                }
            }
        }

        let stages: Vec<StageRecord> = accumulator
            .records()
            .iter()
            .map(|r| r.as_ref().clone())
            .collect();
        let aggregated = sources::aggregate(stages.iter());

        self.sink.try_emit(&RunEvent::RunCompleted {
            session_id: params.session_id.clone(),
            source_count: aggregated.len(),
        });

        Ok(TrainingReport {
            session_id: params.session_id.clone(),
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            stages,
            sources: aggregated,
        })
    }

    async fn execute_stage(
        &self,
        spec: &StageSpec,
        vars: &HashMap<String, String>,
        accumulator: &ContextAccumulator,
    ) -> Result<StageRecord, GreenbriefError> {
        let mut prompt = self.compose_prompt(spec, vars, accumulator)?;

        if let Some(research) = self.gather_research(spec, vars).await? {
            prompt.push_str("\n\nResearch notes:\n");
            prompt.push_str(&research);
        }

        let raw = self
            .generator
            .generate(GenerationRequest::new(prompt))
            .await
            .map_err(|e| StageExecutionError::generation(&spec.name, e))?;

        let reply = StageReply::parse(&spec.name, &raw)?;
        let narrative = reply.narrative.clone();
        let cited = reply.into_sources(&spec.name, Utc::now().date_naive());

        tracing::debug!(stage = %spec.name, sources = cited.len(), "stage reply accepted");

        Ok(StageRecord::new(&spec.name, &spec.title, narrative, cited))
    }

    /// Renders the stage prompt: global parameters substituted into the
    /// instructions, followed by the narratives of declared dependencies
    /// in declaration order.
    fn compose_prompt(
        &self,
        spec: &StageSpec,
        vars: &HashMap<String, String>,
        accumulator: &ContextAccumulator,
    ) -> Result<String, GreenbriefError> {
        let mut prompt = template::render(&spec.instructions, vars)?;

        if !spec.dependencies.is_empty() {
            let view = accumulator.view_for(&spec.name, &spec.dependencies);
            prompt.push_str("\n\nContext from earlier stages:\n");
            for dep in &spec.dependencies {
                let record = view.get(dep)?;
                prompt.push_str(&format!("\n## {}\n{}\n", record.title, record.narrative));
            }
        }

        Ok(prompt)
    }

    /// Runs the stage's search queries concurrently and formats the hits
    /// for prompt embedding. Returns `None` when the stage declares no
    /// queries or no provider is configured.
    async fn gather_research(
        &self,
        spec: &StageSpec,
        vars: &HashMap<String, String>,
    ) -> Result<Option<String>, GreenbriefError> {
        let Some(search) = self.search.as_ref() else {
            return Ok(None);
        };
        if spec.queries.is_empty() {
            return Ok(None);
        }

        let queries = spec
            .queries
            .iter()
            .map(|q| template::render(q, vars))
            .collect::<Result<Vec<_>, _>>()?;

        let results = join_all(queries.iter().map(|q| search.search(q))).await;

        let mut blocks = Vec::with_capacity(queries.len());
        for (query, result) in queries.iter().zip(results) {
            let hits = result.map_err(|e| StageExecutionError::search(&spec.name, e))?;
            self.sink.try_emit(&RunEvent::SearchPerformed {
                stage: spec.name.clone(),
                query: query.clone(),
                hits: hits.len(),
            });
            blocks.push(format_hits(query, &hits));
        }

        Ok(Some(blocks.join("\n")))
    }
}
