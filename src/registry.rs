//! Processor Registry (C1).
//!
//! Holds the set of processors for a deployment, indexed by stage and (for
//! stage 3) by content subtype. Constructed once at startup and thereafter
//! read-only — never an ambient singleton (spec.md §9).

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ProcessorError;
use crate::model::{Classification, Enrichment, Source, Stage};

/// Mutable scratch space threaded through one pipeline invocation. Each
/// processor reads the `Source` and the in-progress `Enrichment` and writes
/// its findings back onto `enrichment`.
pub struct ProcessorContext<'a> {
    pub source: &'a Source,
    pub enrichment: &'a mut Enrichment,
    /// Raw text body resolved once per item (spec.md §4.5 step 4: `body_text`
    /// > `body` > `raw_content`).
    pub body: &'a str,
}

/// Outcome of a single processor run. `Applied` carries a JSON snapshot of
/// what the processor wrote, used to populate `StageResult.output_data`;
/// `NotApplicable` means the processor decided `can_process` was false and
/// must not emit a `StageResult` at all (spec.md §4.3).
pub enum ProcessorOutcome {
    Applied(serde_json::Value),
    NotApplicable,
}

/// Shared contract every processor satisfies.
pub trait Processor: Send + Sync {
    fn name(&self) -> &str;
    fn stage(&self) -> Stage;
    fn process(&self, ctx: &mut ProcessorContext<'_>) -> Result<ProcessorOutcome, ProcessorError>;
}

/// Stage-3 processors additionally advertise the subtypes they own.
pub trait TypedProcessor: Processor {
    fn subtypes(&self) -> &[&'static str];
}

/// Stage-5 (AI extraction) and stage-6 (post-processing) processors expose
/// an explicit applicability check ahead of the registry's generic dispatch.
pub trait ConditionalProcessor: Processor {
    fn should_process(&self, enrichment: &Enrichment) -> bool;
}

/// The stage-1 classifier contract. Distinct from `Processor` because
/// classification runs on a bare `Source` before an `Enrichment` row (or
/// even an in-memory `Enrichment` value) exists — see
/// `pipeline::orchestrate` for why this is the one stage the orchestrator
/// special-cases. Pure: same `Source` in, same `Classification` out.
pub trait ClassifierProcessor: Send + Sync {
    fn name(&self) -> &str;
    fn classify(&self, source: &Source) -> Classification;
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("processor '{0}' is already registered")]
    DuplicateName(String),

    #[error("subtype '{subtype}' is already owned by processor '{owner}'")]
    DuplicateSubtypeOwner { subtype: String, owner: String },
}

/// Indexes processors by stage and, for stage 3, by subtype. Built once at
/// startup and passed by reference to the pipeline.
#[derive(Default)]
pub struct ProcessorRegistry {
    by_stage: HashMap<Stage, Vec<Arc<dyn Processor>>>,
    names: std::collections::HashSet<String>,
    subtype_owners: HashMap<String, String>,
    /// Keyed by subtype; stored as `Arc<dyn Processor>` rather than
    /// `Arc<dyn TypedProcessor>` because only `subtypes()` at registration
    /// time ever needs the typed view — `register_typed` is generic over the
    /// concrete processor type so it can hand out both trait-object forms by
    /// coercing straight from the concrete `Arc<T>`, never from one trait
    /// object to another (that upcast needs a newer compiler than this
    /// crate's declared MSRV).
    typed: HashMap<String, Arc<dyn Processor>>,
    classifier: Option<Arc<dyn ClassifierProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the single stage-1 classifier. Fails if one is already set
    /// — stage 1 has exactly one owner (spec.md §4.1).
    pub fn register_classifier(
        &mut self,
        classifier: Arc<dyn ClassifierProcessor>,
    ) -> Result<(), RegistryError> {
        self.claim_name(classifier.name())?;
        if self.classifier.is_some() {
            return Err(RegistryError::DuplicateName("<classifier>".to_string()));
        }
        self.classifier = Some(classifier);
        Ok(())
    }

    pub fn classifier(&self) -> Option<Arc<dyn ClassifierProcessor>> {
        self.classifier.clone()
    }

    /// Register a plain (stage 2) processor.
    pub fn register(&mut self, processor: Arc<dyn Processor>) -> Result<(), RegistryError> {
        self.claim_name(processor.name())?;
        self.by_stage
            .entry(processor.stage())
            .or_default()
            .push(processor);
        Ok(())
    }

    /// Register a stage-3 processor, enforcing single ownership per subtype.
    /// Generic over the concrete processor type so the `Arc<dyn Processor>`
    /// stored in `typed`/`by_stage` is coerced directly from `Arc<T>`,
    /// rather than from an already-erased `Arc<dyn TypedProcessor>` (which
    /// would require trait-upcasting coercion, unavailable at this crate's
    /// 1.75 MSRV).
    pub fn register_typed<T>(&mut self, processor: Arc<T>) -> Result<(), RegistryError>
    where
        T: TypedProcessor + 'static,
    {
        self.claim_name(processor.name())?;
        for subtype in processor.subtypes() {
            if let Some(owner) = self.subtype_owners.get(*subtype) {
                return Err(RegistryError::DuplicateSubtypeOwner {
                    subtype: (*subtype).to_string(),
                    owner: owner.clone(),
                });
            }
        }
        let as_processor: Arc<dyn Processor> = processor.clone();
        for subtype in processor.subtypes() {
            self.subtype_owners
                .insert((*subtype).to_string(), processor.name().to_string());
            self.typed
                .insert((*subtype).to_string(), as_processor.clone());
        }
        self.by_stage
            .entry(Stage::TypeExtraction)
            .or_default()
            .push(as_processor);
        Ok(())
    }

    fn claim_name(&mut self, name: &str) -> Result<(), RegistryError> {
        if !self.names.insert(name.to_string()) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    /// Processors for `stage`, in registration order. Stage-2 ordering is
    /// deterministic but carries no semantic meaning; stage 1 and 3 have at
    /// most one owner per query.
    pub fn by_stage(&self, stage: Stage) -> &[Arc<dyn Processor>] {
        self.by_stage.get(&stage).map_or(&[], |v| v.as_slice())
    }

    /// The single stage-3 owner for `subtype`, if any.
    pub fn typed_for(&self, subtype: &str) -> Option<Arc<dyn Processor>> {
        self.typed.get(subtype).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy(&'static str, Stage);
    impl Processor for Dummy {
        fn name(&self) -> &str {
            self.0
        }
        fn stage(&self) -> Stage {
            self.1
        }
        fn process(
            &self,
            _ctx: &mut ProcessorContext<'_>,
        ) -> Result<ProcessorOutcome, ProcessorError> {
            Ok(ProcessorOutcome::NotApplicable)
        }
    }

    struct DummyTyped(&'static str, &'static [&'static str]);
    impl Processor for DummyTyped {
        fn name(&self) -> &str {
            self.0
        }
        fn stage(&self) -> Stage {
            Stage::TypeExtraction
        }
        fn process(
            &self,
            _ctx: &mut ProcessorContext<'_>,
        ) -> Result<ProcessorOutcome, ProcessorError> {
            Ok(ProcessorOutcome::NotApplicable)
        }
    }
    impl TypedProcessor for DummyTyped {
        fn subtypes(&self) -> &[&'static str] {
            self.1
        }
    }

    #[test]
    fn rejects_duplicate_name() {
        let mut reg = ProcessorRegistry::new();
        reg.register(Arc::new(Dummy("a", Stage::CommonEnrichment)))
            .unwrap();
        let err = reg
            .register(Arc::new(Dummy("a", Stage::CommonEnrichment)))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(_)));
    }

    #[test]
    fn rejects_duplicate_subtype_owner() {
        let mut reg = ProcessorRegistry::new();
        reg.register_typed(Arc::new(DummyTyped("jira", &["notification/jira"])))
            .unwrap();
        let err = reg
            .register_typed(Arc::new(DummyTyped(
                "jira2",
                &["notification/jira"],
            )))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateSubtypeOwner { .. }
        ));
    }

    #[test]
    fn typed_for_returns_single_owner() {
        let mut reg = ProcessorRegistry::new();
        reg.register_typed(Arc::new(DummyTyped("jira", &["notification/jira"])))
            .unwrap();
        assert!(reg.typed_for("notification/jira").is_some());
        assert!(reg.typed_for("email/thread").is_none());
    }

    #[test]
    fn by_stage_preserves_registration_order() {
        let mut reg = ProcessorRegistry::new();
        reg.register(Arc::new(Dummy("first", Stage::CommonEnrichment)))
            .unwrap();
        reg.register(Arc::new(Dummy("second", Stage::CommonEnrichment)))
            .unwrap();
        let names: Vec<&str> = reg
            .by_stage(Stage::CommonEnrichment)
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
