//! Classifier (Stage 1, C2).
//!
//! Rule-based, priority-ordered, first-match-wins, case-insensitive,
//! whitespace-trimmed. Two independent classifications run per item:
//! `(content_type, subtype, profile)` and `source_system`. Pure: same
//! `Source` in, same `Classification` out, no I/O (spec.md §4.2, §8).

mod content_type;
mod source_system;
mod wildcard;

use std::collections::HashMap;

use serde_json::Value;

use crate::model::{Classification, Source};
use crate::registry::ClassifierProcessor;

/// A normalized view over the header-ish fields the classifier consumes,
/// lower-cased and trimmed once up front so every rule can do plain
/// substring/prefix checks.
pub(crate) struct ClassifierInput {
    pub subject: String,
    pub from: String,
    pub message_id: String,
    pub headers: HashMap<String, String>,
    pub has_calendar_attachment: bool,
    pub attachment_filenames: Vec<String>,
    pub has_in_reply_to: bool,
    pub has_references: bool,
}

impl ClassifierInput {
    fn from_source(source: &Source) -> Self {
        let subject = lower_trim(source.metadata_str("subject"));
        let from = lower_trim(source.metadata_str("from"));
        let message_id = lower_trim(source.metadata_str("message_id"));

        let headers = source
            .metadata
            .get("headers")
            .and_then(|v| v.as_object())
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.to_lowercase(), s.to_lowercase().trim().to_string())))
                    .collect()
            })
            .unwrap_or_default();

        let attachments = source
            .metadata
            .get("attachments")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let has_calendar_attachment = attachments.iter().any(|a| attachment_is_calendar(a));
        let attachment_filenames = attachments
            .iter()
            .filter_map(|a| a.get("filename").and_then(|v| v.as_str()))
            .map(|s| s.to_lowercase())
            .collect();

        let declared_content_type = lower_trim(Some(source.content_type.as_str()));

        let has_in_reply_to = headers.contains_key("in-reply-to")
            || source.metadata.get("in_reply_to").map_or(false, not_blank);
        let has_references = headers.contains_key("references")
            || source.metadata.get("references").map_or(false, not_blank);

        let mut input = ClassifierInput {
            subject,
            from,
            message_id,
            headers,
            has_calendar_attachment,
            attachment_filenames,
            has_in_reply_to,
            has_references,
        };
        if declared_content_type.contains("text/calendar") {
            input.has_calendar_attachment = true;
        }
        input
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    pub fn has_any_auto_header(&self) -> bool {
        self.header("auto-submitted").map_or(false, |v| v != "no")
            || self.header("precedence").map_or(false, |v| v == "bulk")
            || self.header("x-auto-response-suppress").is_some()
    }
}

fn attachment_is_calendar(a: &Value) -> bool {
    let mime = a
        .get("mime_type")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_lowercase();
    let filename = a
        .get("filename")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_lowercase();
    mime.contains("calendar") || filename.ends_with(".ics")
}

fn lower_trim(v: Option<&str>) -> String {
    v.unwrap_or_default().trim().to_lowercase()
}

/// A metadata field counts as "present" for thread-signal rules when it is
/// a non-empty string or a non-empty array, using the same multi-shape
/// tolerance as `crate::shapes::as_string_list`.
fn not_blank(v: &Value) -> bool {
    !crate::shapes::as_string_list(Some(v)).is_empty()
}

/// The built-in rule-based classifier. Stateless; safe to share across
/// concurrent pipeline invocations.
pub struct Classifier;

impl Classifier {
    pub fn new() -> Self {
        Classifier
    }

    pub fn classify_pure(source: &Source) -> Classification {
        let input = ClassifierInput::from_source(source);
        let (content_type, subtype, profile, rule_name, reason, rule_priority) =
            content_type::classify(&input);
        let source_system = source_system::classify(&input);

        Classification {
            content_type,
            subtype: subtype.to_string(),
            profile,
            source_system,
            rule_name: rule_name.to_string(),
            reason: reason.to_string(),
            rule_priority,
            confidence: 1.0,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierProcessor for Classifier {
    fn name(&self) -> &str {
        "classifier"
    }

    fn classify(&self, source: &Source) -> Classification {
        Self::classify_pure(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentType, ProcessingProfile, SourceSystem};
    use serde_json::json;
    use std::collections::HashMap as Map;

    fn source_with(metadata: Map<String, Value>) -> Source {
        Source {
            id: "s1".into(),
            tenant_id: "t1".into(),
            source_system: "test".into(),
            external_id: None,
            content_hash: "h".into(),
            raw_content: String::new(),
            content_type: "text/plain".into(),
            metadata,
        }
    }

    #[test]
    fn empty_everything_is_standalone_human_email() {
        let source = source_with(Map::new());
        let c = Classifier::classify_pure(&source);
        assert_eq!(c.content_type, ContentType::Email);
        assert_eq!(c.subtype, "email/standalone");
        assert_eq!(c.profile, ProcessingProfile::FullAi);
        assert_eq!(c.source_system, SourceSystem::HumanEmail);
    }

    #[test]
    fn calendar_cancellation_with_ics_attachment() {
        let mut meta = Map::new();
        meta.insert("subject".into(), json!("Canceled: Weekly Standup"));
        meta.insert(
            "attachments".into(),
            json!([{"filename": "invite.ics", "mime_type": "text/calendar"}]),
        );
        let source = source_with(meta);
        let c = Classifier::classify_pure(&source);
        assert_eq!(c.content_type, ContentType::Calendar);
        assert_eq!(c.subtype, "calendar/cancellation");
        assert_eq!(c.profile, ProcessingProfile::StateTracking);
    }

    #[test]
    fn jira_notification_with_auto_submitted() {
        let mut meta = Map::new();
        meta.insert("from".into(), json!("jira@acme.atlassian.net"));
        meta.insert("subject".into(), json!("[OUT-697] Updates for Launch"));
        meta.insert(
            "headers".into(),
            json!({"Auto-Submitted": "auto-generated"}),
        );
        let source = source_with(meta);
        let c = Classifier::classify_pure(&source);
        assert_eq!(c.subtype, "notification/jira");
        assert_eq!(c.profile, ProcessingProfile::MetadataOnly);
        assert_eq!(c.source_system, SourceSystem::Jira);
    }

    #[test]
    fn thread_reply_with_in_reply_to() {
        let mut meta = Map::new();
        meta.insert("subject".into(), json!("Re: Project Discussion"));
        meta.insert("in_reply_to".into(), json!("<m2@x>"));
        let source = source_with(meta);
        let c = Classifier::classify_pure(&source);
        assert_eq!(c.subtype, "email/thread");
        assert_eq!(c.profile, ProcessingProfile::FullAi);
    }

    #[test]
    fn forward_prefix_detected() {
        let mut meta = Map::new();
        meta.insert("subject".into(), json!("Fwd: Contract Terms"));
        let source = source_with(meta);
        let c = Classifier::classify_pure(&source);
        assert_eq!(c.subtype, "email/forward");
    }

    #[test]
    fn google_docs_noreply_wildcard_rule() {
        let mut meta = Map::new();
        meta.insert("from".into(), json!("drive-shares-dm-noreply@docs.google.com"));
        let source = source_with(meta);
        let c = Classifier::classify_pure(&source);
        assert_eq!(c.source_system, SourceSystem::GoogleDocs);
    }

    #[test]
    fn google_docs_alternate_clause() {
        // "@google.com" AND "noreply" in from, without the docs.google.com wildcard form.
        let mut meta = Map::new();
        meta.insert("from".into(), json!("noreply-updates@google.com"));
        let source = source_with(meta);
        let c = Classifier::classify_pure(&source);
        assert_eq!(c.source_system, SourceSystem::GoogleDocs);
    }

    #[test]
    fn classification_is_pure_across_repeated_calls() {
        let mut meta = Map::new();
        meta.insert("subject".into(), json!("Can we ship Friday?"));
        let source = source_with(meta);
        let a = Classifier::classify_pure(&source);
        let b = Classifier::classify_pure(&source);
        assert_eq!(a.subtype, b.subtype);
        assert_eq!(a.profile, b.profile);
        assert_eq!(a.source_system, b.source_system);
    }
}
