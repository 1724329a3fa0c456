//! Pipeline construction and execution.
//!
//! - [`StageSpec`] describes one stage
//! - [`PipelineBuilder`] validates the dependency graph
//! - [`StageRunner`] executes the stages sequentially

mod builder;
mod runner;
mod spec;

pub use builder::{Pipeline, PipelineBuilder};
pub use runner::StageRunner;
pub use spec::StageSpec;
