//! Top-level pipeline entry points (spec.md §6): `process` for a single
//! item, `process_batch` for a list, both driven by `orchestrate::process`.

pub mod context;
pub mod orchestrate;

use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;
use crate::model::{Enrichment, Source};

pub use context::PipelineContext;

pub struct Pipeline {
    ctx: PipelineContext,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self {
            ctx,
            cancel: CancellationToken::new(),
        }
    }

    /// A token callers can use to cancel in-flight and not-yet-started work.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn process(&self, source: Source) -> Result<Enrichment, PipelineError> {
        orchestrate::process(&self.ctx, source, &self.cancel).await
    }

    /// Processes every source in order, honoring cancellation between items.
    /// Collects one result per input; a cancelled or failed item does not
    /// stop the rest of the batch.
    pub async fn process_batch(&self, sources: Vec<Source>) -> Vec<Result<Enrichment, PipelineError>> {
        let mut results = Vec::with_capacity(sources.len());
        for source in sources {
            if self.cancel.is_cancelled() {
                results.push(Err(PipelineError::Cancelled { stage: "classification" }));
                continue;
            }
            results.push(orchestrate::process(&self.ctx, source, &self.cancel).await);
        }
        results
    }
}
