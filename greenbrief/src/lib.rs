//! # Greenbrief
//!
//! A sequential content-generation pipeline for sustainability-messaging
//! training.
//!
//! Greenbrief runs an ordered chain of prompt-driven stages against an
//! opaque text-generation service, accumulating each stage's narrative as
//! context for the next, then deduplicates the citations the stages report
//! and assembles everything into one training report:
//!
//! - **Stage pipeline**: declared stages with explicit dependencies,
//!   validated before a run starts
//! - **Context accumulation**: write-once per stage, read-only for prompt
//!   assembly
//! - **Source aggregation**: URL-normalized dedup with per-stage
//!   attribution
//! - **Report assembly**: a pure, deterministic render of the final
//!   document
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use greenbrief::prelude::*;
//! use std::sync::Arc;
//!
//! let pipeline = PipelineBuilder::from_config(PipelineConfig::builtin()?)?;
//! let params = GlobalParams::new("Retail", "EU Green Claims Directive");
//!
//! let runner = StageRunner::new(generator).with_search(search);
//! let report = runner.run(&pipeline, &params).await?;
//! println!("{}", greenbrief::report::assemble(&report));
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancel;
pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod export;
pub mod llm;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod search;
pub mod sources;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancel::CancellationToken;
    pub use crate::config::{GlobalParams, PipelineConfig, StageConfig};
    pub use crate::context::{ContextAccumulator, DependencyView};
    pub use crate::errors::{
        DuplicateStageError, GreenbriefError, MalformedOutputError,
        PipelineValidationError, StageExecutionError, UndeclaredDependencyError,
    };
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RunEvent,
    };
    pub use crate::llm::{GenerationRequest, Generator, StageReply};
    pub use crate::model::{SourceCategory, SourceReference, StageRecord, TrainingReport};
    pub use crate::pipeline::{Pipeline, PipelineBuilder, StageRunner, StageSpec};
    pub use crate::report::assemble;
    pub use crate::search::{SearchHit, SearchProvider};
    pub use crate::sources::{aggregate, SourceAggregator};
}
