//! Type-Specific Extractors (Stage 3, C4).
//!
//! Dispatched by subtype; at most one owner runs per item (spec.md §4.4).

pub mod calendar;
pub mod forward;
pub mod jira;
pub mod thread_context;

use std::sync::Arc;

use crate::registry::{ProcessorRegistry, RegistryError};

pub fn register_all(registry: &mut ProcessorRegistry) -> Result<(), RegistryError> {
    registry.register_typed(Arc::new(jira::JiraExtractor))?;
    registry.register_typed(Arc::new(calendar::CalendarExtractor))?;
    registry.register_typed(Arc::new(thread_context::ThreadContextBuilder))?;
    registry.register_typed(Arc::new(forward::ForwardUnwrap))?;
    Ok(())
}
