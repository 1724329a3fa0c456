//! Runs the built-in training pipeline against live collaborators.
//!
//! Reads `OPENAI_API_KEY` (required) and `SERPER_API_KEY` (optional;
//! without it stages run unresearched), plus `GREENBRIEF_INDUSTRY` and
//! `GREENBRIEF_REGULATIONS` for the training parameters.

use anyhow::Result;
use greenbrief::config::{GlobalParams, PipelineConfig};
use greenbrief::events::LoggingEventSink;
use greenbrief::export::ReportWriter;
use greenbrief::llm::{ChatClient, GenerationConfig};
use greenbrief::pipeline::{PipelineBuilder, StageRunner};
use greenbrief::search::{SerperClient, SerperConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    greenbrief::observability::init();

    let industry =
        std::env::var("GREENBRIEF_INDUSTRY").unwrap_or_else(|_| "Marketing Agency".to_string());
    let regulations = std::env::var("GREENBRIEF_REGULATIONS")
        .unwrap_or_else(|_| "EU Green Claims Directive, CSRD".to_string());

    let params = GlobalParams::new(industry, regulations);
    let pipeline = PipelineBuilder::from_config(PipelineConfig::builtin()?)?;

    tracing::info!(session = %params.session_id, stages = pipeline.stage_count(), "starting training run");

    let generator = Arc::new(ChatClient::new(GenerationConfig::from_env())?);
    let mut runner =
        StageRunner::new(generator).with_event_sink(Arc::new(LoggingEventSink::new()));

    let search_config = SerperConfig::from_env();
    if search_config.api_key.is_some() {
        runner = runner.with_search(Arc::new(SerperClient::new(search_config)?));
    } else {
        tracing::warn!("SERPER_API_KEY not set; stages run without web research");
    }

    let report = runner.run(&pipeline, &params).await?;

    let writer = ReportWriter::new("outputs");
    let text_path = writer.write_text(&report)?;
    let json_path = writer.write_json(&report)?;

    println!("{}", greenbrief::report::assemble(&report));
    eprintln!("Report saved: {}", text_path.display());
    eprintln!("Structured data saved: {}", json_path.display());

    Ok(())
}
