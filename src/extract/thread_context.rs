//! Thread-context builder (spec.md §4.4), owns subtype `email/thread`.
//!
//! Collects prior-message references for the Context Builder to consume at
//! stage 5; it persists nothing of its own beyond the StageResult audit row.

use crate::error::ProcessorError;
use crate::model::Stage;
use crate::registry::{Processor, ProcessorContext, ProcessorOutcome, TypedProcessor};

pub struct ThreadContextBuilder;

impl Processor for ThreadContextBuilder {
    fn name(&self) -> &str {
        "thread_context_builder"
    }

    fn stage(&self) -> Stage {
        Stage::TypeExtraction
    }

    fn process(&self, ctx: &mut ProcessorContext<'_>) -> Result<ProcessorOutcome, ProcessorError> {
        let references = ctx
            .enrichment
            .extracted_data
            .thread
            .as_ref()
            .map(|t| t.references.clone())
            .unwrap_or_default();

        Ok(ProcessorOutcome::Applied(
            serde_json::json!({ "prior_message_count": references.len() }),
        ))
    }
}

impl TypedProcessor for ThreadContextBuilder {
    fn subtypes(&self) -> &[&'static str] {
        &["email/thread"]
    }
}
