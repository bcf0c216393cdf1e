//! Post-Processors (Stage 6): mention candidate collection and persistence
//! (spec.md §4.6). Runs only when `ai_processed=true`.

use std::collections::HashSet;

use crate::ai::parse::ExtractionOutput;
use crate::error::ResolverError;
use crate::model::{Enrichment, EntityType};
use crate::resolver::entity_lookup::EntityLookup;
use crate::storage::Repository;

/// A not-yet-resolved reference to some entity, gathered from either the
/// LLM extraction output or the participant list.
#[derive(Debug, Clone)]
pub struct MentionCandidate {
    pub entity_type: EntityType,
    pub text: String,
    pub context_snippet: String,
    pub project_context_id: Option<String>,
}

pub fn should_run(enrichment: &Enrichment) -> bool {
    enrichment.ai_processed
}

/// Collects mention candidates from (a) every role slot in the extraction
/// output and (b) the resolved participant list, deduplicated by
/// `(entity_type, lowercased text)` — the content id is constant per call
/// so it's not part of the in-memory key.
pub fn collect_candidates(enrichment: &Enrichment) -> Vec<MentionCandidate> {
    let mut seen: HashSet<(EntityType, String)> = HashSet::new();
    let mut candidates = Vec::new();

    let mut push = |entity_type: EntityType, text: String, context_snippet: String| {
        let key = (entity_type, text.to_lowercase());
        if text.is_empty() || !seen.insert(key) {
            return;
        }
        candidates.push(MentionCandidate {
            entity_type,
            text,
            context_snippet,
            project_context_id: enrichment.project_id.clone(),
        });
    };

    if let Some(extraction) = &enrichment.extracted_data.extraction {
        if let Ok(output) = serde_json::from_value::<ExtractionOutput>(extraction.clone()) {
            for item in role_slots(&output) {
                if let Some(name) = &item.0 {
                    push(EntityType::Person, name.clone(), item.1);
                }
            }
        }
    }

    for participant in &enrichment.resolved_participants {
        let text = participant.name.clone().unwrap_or_else(|| participant.email.clone());
        push(EntityType::Person, text, format!("{:?} participant", participant.role));
    }

    candidates
}

fn role_slots(output: &ExtractionOutput) -> Vec<(Option<String>, String)> {
    output
        .risks
        .iter()
        .chain(output.actions.iter())
        .chain(output.issues.iter())
        .chain(output.decisions.iter())
        .chain(output.commitments.iter())
        .chain(output.questions.iter())
        .map(|item| (item.role.clone(), item.description.clone()))
        .collect()
}

/// Collects candidates, resolves each through the mention resolver, and
/// persists the resulting Mention rows.
pub async fn run(
    repo: &dyn Repository,
    lookup: &dyn EntityLookup,
    tenant_id: &str,
    content_id: &str,
    enrichment: &Enrichment,
) -> Result<(), ResolverError> {
    if !should_run(enrichment) {
        return Ok(());
    }

    let candidates = collect_candidates(enrichment);
    if candidates.is_empty() {
        return Ok(());
    }

    let mentions = crate::resolver::resolve_all(repo, lookup, tenant_id, content_id, candidates).await?;
    if !mentions.is_empty() {
        repo.save_mentions(&mentions).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Classification, ContentType, ParticipantRole, ProcessingProfile, ResolvedParticipant, Source, SourceSystem};
    use std::collections::HashMap;

    fn sample_source() -> Source {
        Source {
            id: "src_1".to_string(),
            tenant_id: "tenant_a".to_string(),
            source_system: "email".to_string(),
            external_id: None,
            content_hash: "abc".to_string(),
            raw_content: "hi".to_string(),
            content_type: "message/rfc822".to_string(),
            metadata: HashMap::new(),
        }
    }

    fn sample_enrichment() -> Enrichment {
        let source = sample_source();
        let mut enrichment = Enrichment::new_pending(
            &source,
            Classification {
                content_type: ContentType::Email,
                subtype: "email/standalone".to_string(),
                profile: ProcessingProfile::FullAi,
                source_system: SourceSystem::HumanEmail,
                rule_name: "default_email".to_string(),
                reason: "fallback".to_string(),
                rule_priority: 100,
                confidence: 0.5,
            },
        );
        enrichment.resolved_participants = vec![ResolvedParticipant {
            name: Some("Jane Doe".to_string()),
            email: "jane@acme.com".to_string(),
            role: ParticipantRole::Sender,
            is_internal: None,
        }];
        enrichment
    }

    #[test]
    fn should_run_requires_ai_processed() {
        let mut enrichment = sample_enrichment();
        assert!(!should_run(&enrichment));
        enrichment.ai_processed = true;
        assert!(should_run(&enrichment));
    }

    #[test]
    fn collects_participants_and_role_slots_deduplicated() {
        let mut enrichment = sample_enrichment();
        enrichment.extracted_data.extraction = Some(serde_json::json!({
            "actions": [
                {"description": "follow up", "role": "Jane Doe", "confidence": 0.7},
                {"description": "follow up again", "role": "jane doe", "confidence": 0.6}
            ]
        }));

        let candidates = collect_candidates(&enrichment);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text, "Jane Doe");
    }

    #[test]
    fn empty_role_without_name_is_skipped() {
        let mut enrichment = sample_enrichment();
        enrichment.resolved_participants.clear();
        enrichment.extracted_data.extraction = Some(serde_json::json!({
            "risks": [{"description": "no owner named", "confidence": 0.4}]
        }));

        assert!(collect_candidates(&enrichment).is_empty());
    }
}
