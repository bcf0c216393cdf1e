//! Thread grouper (spec.md §4.3): reads message/thread identity fields and
//! determines the thread root. Email-only.

use serde_json::Value;

use crate::error::ProcessorError;
use crate::model::{ContentType, Stage, ThreadData};
use crate::registry::{Processor, ProcessorContext, ProcessorOutcome};

const SUBJECT_PREFIXES: &[&str] = &["re:", "fwd:", "fw:"];

pub struct ThreadGrouper;

impl Processor for ThreadGrouper {
    fn name(&self) -> &str {
        "thread_grouper"
    }

    fn stage(&self) -> Stage {
        Stage::CommonEnrichment
    }

    fn process(&self, ctx: &mut ProcessorContext<'_>) -> Result<ProcessorOutcome, ProcessorError> {
        let is_email = ctx
            .enrichment
            .classification
            .as_ref()
            .map_or(false, |c| c.content_type == ContentType::Email);
        if !is_email {
            return Ok(ProcessorOutcome::NotApplicable);
        }

        let meta = &ctx.source.metadata;
        let message_id = meta.get("message_id").and_then(|v| v.as_str()).map(str::to_string);
        let in_reply_to = meta.get("in_reply_to").and_then(|v| v.as_str()).map(str::to_string);
        let references = crate::shapes::as_string_list(meta.get("references"));

        let subject = meta.get("subject").and_then(|v| v.as_str()).unwrap_or_default();
        let normalized_subject = normalize_subject(subject);

        let is_reply_or_forward = in_reply_to.is_some() || !references.is_empty();

        let thread_root = references
            .first()
            .cloned()
            .or_else(|| in_reply_to.clone())
            .or_else(|| {
                if !is_reply_or_forward {
                    message_id.clone()
                } else {
                    None
                }
            });

        let thread = ThreadData {
            message_id: message_id.clone(),
            in_reply_to,
            references,
            normalized_subject: Some(normalized_subject),
            thread_root: thread_root.clone(),
        };

        ctx.enrichment.thread_id = thread_root.or_else(|| message_id.clone());
        let snapshot = serde_json::to_value(&thread).unwrap_or(Value::Null);
        ctx.enrichment.extracted_data.thread = Some(thread);
        Ok(ProcessorOutcome::Applied(snapshot))
    }
}

/// Strips `Re:`/`Fwd:`/`FW:` prefixes iteratively (case-insensitive,
/// optional trailing space) until none remain.
fn normalize_subject(subject: &str) -> String {
    let mut current = subject.trim();
    loop {
        let lower = current.to_lowercase();
        let matched = SUBJECT_PREFIXES.iter().find(|p| lower.starts_with(**p));
        match matched {
            Some(p) => {
                current = current[p.len()..].trim_start();
            }
            None => break,
        }
    }
    current.to_string()
}
