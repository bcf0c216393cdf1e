//! Common Enrichers (Stage 2, C3).
//!
//! Every stage-2 processor runs for every item, in registration order; each
//! decides internally whether it applies. A failing processor never aborts
//! the pipeline (spec.md §4.3).

pub mod links;
pub mod participants;
pub mod thread;

use std::sync::Arc;

use crate::registry::{ProcessorRegistry, RegistryError};

/// Registers the built-in stage-2 processors in the order the pipeline
/// should run them.
pub fn register_all(registry: &mut ProcessorRegistry) -> Result<(), RegistryError> {
    registry.register(Arc::new(participants::ParticipantExtractor))?;
    registry.register(Arc::new(links::LinkExtractor::default()))?;
    registry.register(Arc::new(thread::ThreadGrouper))?;
    Ok(())
}
