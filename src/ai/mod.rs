//! AI Router (Stage 4) and LLM Extractor (Stage 5) (spec.md §4.5).

pub mod extractor;
pub mod parse;
pub mod router;

pub use extractor::{AiExtractor, Extractor, LlmExtractorConfig};
pub use router::RouteDecision;
