//! Shared, read-only handles threaded through one pipeline invocation
//! (spec.md §5 shared-resource policy: registry, repository, and LLM
//! client are initialized once and safe for concurrent use).

use std::sync::Arc;

use crate::ai::Extractor;
use crate::registry::ProcessorRegistry;
use crate::resolver::entity_lookup::EntityLookup;
use crate::storage::Repository;

#[derive(Clone)]
pub struct PipelineContext {
    pub registry: Arc<ProcessorRegistry>,
    pub repo: Arc<dyn Repository>,
    pub extractor: Arc<dyn Extractor>,
    pub entity_lookup: Arc<dyn EntityLookup>,
}

impl PipelineContext {
    pub fn new(
        registry: Arc<ProcessorRegistry>,
        repo: Arc<dyn Repository>,
        extractor: Arc<dyn Extractor>,
        entity_lookup: Arc<dyn EntityLookup>,
    ) -> Self {
        Self {
            registry,
            repo,
            extractor,
            entity_lookup,
        }
    }
}
