//! Mention Resolver (C10, Stage 6): resolves mention candidates to entity
//! ids with a three-tier confidence model, highest-confidence tier first
//! (spec.md §4.6).

pub mod entity_lookup;

use crate::error::ResolverError;
use crate::model::{uuid_like, EntityType, Mention, MentionStatus, MentionTier};
use crate::postprocess::MentionCandidate;
use crate::storage::Repository;
use entity_lookup::EntityLookup;

/// A candidate is auto-linked once a single affinity/candidate match clears
/// this confidence bar.
const AUTO_LINK_THRESHOLD: f64 = 0.75;
/// Two or more candidates within this margin of the top score are treated
/// as genuinely ambiguous rather than picking the highest arbitrarily.
const AMBIGUOUS_MARGIN: f64 = 0.1;

const EXACT_IDENTITY_CONFIDENCE: f64 = 0.95;
const PATTERN_CACHE_CONFIDENCE: f64 = 0.85;

pub async fn resolve_all(
    repo: &dyn Repository,
    lookup: &dyn EntityLookup,
    tenant_id: &str,
    content_id: &str,
    candidates: Vec<MentionCandidate>,
) -> Result<Vec<Mention>, ResolverError> {
    let mut mentions = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        mentions.push(resolve_one(repo, lookup, tenant_id, content_id, candidate).await?);
    }
    Ok(mentions)
}

async fn resolve_one(
    repo: &dyn Repository,
    lookup: &dyn EntityLookup,
    tenant_id: &str,
    content_id: &str,
    candidate: MentionCandidate,
) -> Result<Mention, ResolverError> {
    let id = uuid_like(
        &format!("{content_id}:{}:{}", candidate.entity_type.as_str(), candidate.text),
        "mtn",
    );

    if let Some(resolved) = try_exact_identity(repo, tenant_id, &candidate).await? {
        return Ok(finish(id, content_id, &candidate, resolved, MentionStatus::AutoLinked, EXACT_IDENTITY_CONFIDENCE, MentionTier::ExactIdentity));
    }

    if let Some(resolved) = try_pattern_cache(repo, tenant_id, &candidate).await? {
        return Ok(finish(id, content_id, &candidate, resolved, MentionStatus::PatternLinked, PATTERN_CACHE_CONFIDENCE, MentionTier::PatternCache));
    }

    let (status, entity_id, confidence) = try_affinity(lookup, tenant_id, &candidate).await?;

    if let (Some(entity_id), Some(project_id)) = (&entity_id, &candidate.project_context_id) {
        if status == MentionStatus::AutoLinked {
            repo.bump_affinity(entity_id, project_id).await?;
        }
    }

    Ok(Mention {
        id,
        content_id: content_id.to_string(),
        entity_type: candidate.entity_type,
        mentioned_text: candidate.text,
        context_snippet: candidate.context_snippet,
        project_context_id: candidate.project_context_id,
        entity_id,
        status,
        confidence,
        tier: MentionTier::Affinity,
    })
}

fn finish(
    id: String,
    content_id: &str,
    candidate: &MentionCandidate,
    entity_id: String,
    status: MentionStatus,
    confidence: f64,
    tier: MentionTier,
) -> Mention {
    Mention {
        id,
        content_id: content_id.to_string(),
        entity_type: candidate.entity_type,
        mentioned_text: candidate.text.clone(),
        context_snippet: candidate.context_snippet.clone(),
        project_context_id: candidate.project_context_id.clone(),
        entity_id: Some(entity_id),
        status,
        confidence,
        tier,
    }
}

async fn try_exact_identity(
    repo: &dyn Repository,
    tenant_id: &str,
    candidate: &MentionCandidate,
) -> Result<Option<String>, ResolverError> {
    if candidate.entity_type != EntityType::Person || !candidate.text.contains('@') {
        return Ok(None);
    }
    let person = repo.get_person(tenant_id, &candidate.text).await?;
    Ok(person.map(|p| p.id))
}

async fn try_pattern_cache(
    repo: &dyn Repository,
    tenant_id: &str,
    candidate: &MentionCandidate,
) -> Result<Option<String>, ResolverError> {
    let pattern = repo
        .get_mention_pattern(
            tenant_id,
            candidate.entity_type,
            &candidate.text,
            candidate.project_context_id.as_deref(),
        )
        .await?;

    match pattern {
        Some(pattern) => {
            repo.bump_pattern_links(pattern.id).await?;
            Ok(Some(pattern.entity_id))
        }
        None => Ok(None),
    }
}

async fn try_affinity(
    lookup: &dyn EntityLookup,
    tenant_id: &str,
    candidate: &MentionCandidate,
) -> Result<(MentionStatus, Option<String>, f64), ResolverError> {
    let mut candidates = lookup
        .candidates(tenant_id, candidate.entity_type, &candidate.text)
        .await?;
    candidates.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());

    let above_threshold: Vec<_> = candidates
        .iter()
        .filter(|c| c.confidence >= AUTO_LINK_THRESHOLD)
        .collect();

    match above_threshold.as_slice() {
        [] => Ok((MentionStatus::QueuedForReview, None, 0.0)),
        [only] => Ok((MentionStatus::AutoLinked, Some(only.entity_id.clone()), only.confidence)),
        [top, rest @ ..] => {
            let close = rest.iter().any(|c| top.confidence - c.confidence <= AMBIGUOUS_MARGIN);
            if close {
                Ok((MentionStatus::Ambiguous, None, top.confidence))
            } else {
                Ok((MentionStatus::AutoLinked, Some(top.entity_id.clone()), top.confidence))
            }
        }
    }
}
