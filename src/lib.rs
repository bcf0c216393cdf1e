//! Core library for the enrichment pipeline.
//!
//! Classifies ingested business content, runs rule-based and LLM-driven
//! extractors, and resolves mentions into an auditable `Enrichment` record.
pub mod ai;
pub mod classify;
pub mod config;
pub mod context;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod llm;
pub mod model;
pub mod pipeline;
pub mod postprocess;
pub mod registry;
pub mod resolver;
pub mod shapes;
pub mod storage;
pub mod templates;

pub use error::PipelineError;
pub use model::{Enrichment, Source};
pub use pipeline::Pipeline;

/// Returns the version of the enrich-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
