//! Participant extractor (spec.md §4.3): normalizes `from`/`to`/`cc` into
//! `resolved_participants`.

use serde_json::Value;

use crate::model::{ParticipantRole, ResolvedParticipant};
use crate::registry::{Processor, ProcessorContext, ProcessorOutcome};
use crate::error::ProcessorError;
use crate::model::Stage;

pub struct ParticipantExtractor;

impl Processor for ParticipantExtractor {
    fn name(&self) -> &str {
        "participant_extractor"
    }

    fn stage(&self) -> Stage {
        Stage::CommonEnrichment
    }

    fn process(&self, ctx: &mut ProcessorContext<'_>) -> Result<ProcessorOutcome, ProcessorError> {
        let mut participants = Vec::new();

        if let Some(from) = ctx.source.metadata.get("from") {
            extend_from_field(&mut participants, from, ParticipantRole::Sender);
        }
        if let Some(to) = ctx.source.metadata.get("to") {
            extend_from_field(&mut participants, to, ParticipantRole::Recipient);
        }
        if let Some(cc) = ctx.source.metadata.get("cc") {
            extend_from_field(&mut participants, cc, ParticipantRole::Cc);
        }

        let snapshot = serde_json::to_value(&participants).unwrap_or(Value::Null);
        ctx.enrichment.resolved_participants = participants;
        Ok(ProcessorOutcome::Applied(snapshot))
    }
}

fn extend_from_field(out: &mut Vec<ResolvedParticipant>, value: &Value, role: ParticipantRole) {
    for raw in crate::shapes::as_string_list(Some(value)) {
        if let Some(p) = parse_participant(&raw, role) {
            out.push(p);
        }
    }
}

/// Parses one address envelope, e.g. `"Doe, Jane" <jane.doe@acme.com>` or
/// a bare `jane.doe@acme.com`.
fn parse_participant(raw: &str, role: ParticipantRole) -> Option<ResolvedParticipant> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let (name_part, email_part) = match (raw.find('<'), raw.find('>')) {
        (Some(open), Some(close)) if close > open => {
            (raw[..open].trim(), raw[open + 1..close].trim())
        }
        _ => ("", raw),
    };

    let email = email_part.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return None;
    }

    let name = normalize_display_name(name_part);

    Some(ResolvedParticipant {
        name,
        email,
        role,
        is_internal: None,
    })
}

/// `"Last, First"` → `"First Last"`; strips surrounding quotes; a bare
/// single token is returned unchanged.
fn normalize_display_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches('"').trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some((last, first)) = trimmed.split_once(',') {
        let last = last.trim();
        let first = first.trim();
        if !last.is_empty() && !first.is_empty() {
            return Some(format!("{first} {last}"));
        }
    }
    Some(trimmed.to_string())
}
