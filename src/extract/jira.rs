//! Jira notification extractor (spec.md §4.4), owns subtype `notification/jira`.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ProcessorError;
use crate::model::{JiraData, Stage};
use crate::registry::{Processor, ProcessorContext, ProcessorOutcome, TypedProcessor};

const CHANGE_KEYWORDS: &[(&str, &str)] = &[
    ("created", "created"),
    ("assigned", "assignee_changed"),
    ("assignee", "assignee_changed"),
    ("commented", "commented"),
    ("comment", "commented"),
    ("resolved", "resolved"),
    ("reopened", "reopened"),
    ("status", "status_changed"),
    ("priority", "priority_changed"),
    ("updated", "updated"),
];

pub struct JiraExtractor;

fn ticket_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[?([A-Z]{2,10}-\d+)\]?").expect("jira key regex must compile"))
}

fn status_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)status:\s*([\w\s]+?)\s*(?:→|->)\s*([\w\s]+)").expect("status regex must compile")
    })
}

fn priority_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)priority:\s*([^\n\r]+)").expect("priority regex must compile"))
}

fn assignee_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)assignee:\s*([^\n\r]+)").expect("assignee regex must compile"))
}

fn reporter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)reporter:\s*([^\n\r]+)").expect("reporter regex must compile"))
}

fn comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)commented:\s*(.+?)(?:\n\s*\n|\z)").expect("comment regex must compile")
    })
}

impl Processor for JiraExtractor {
    fn name(&self) -> &str {
        "jira_extractor"
    }

    fn stage(&self) -> Stage {
        Stage::TypeExtraction
    }

    fn process(&self, ctx: &mut ProcessorContext<'_>) -> Result<ProcessorOutcome, ProcessorError> {
        let subject = ctx.source.metadata_str("subject").unwrap_or_default();
        let body = ctx.body;

        let ticket_key = extract_ticket_key(subject, body);
        let project_key = ticket_key
            .as_ref()
            .and_then(|k| k.split('-').next())
            .map(str::to_string);

        let mut data = JiraData {
            ticket_key,
            project_key,
            summary: Some(strip_ticket_prefix(subject)),
            change_type: detect_change_type(subject),
            changed_by: ctx.source.metadata_str("from").map(str::to_string),
            ..JiraData::default()
        };

        if let Some(caps) = status_re().captures(body) {
            data.change_type = Some("status_changed".to_string());
            data.from_value = Some(caps[1].trim().to_string());
            data.to_value = Some(caps[2].trim().to_string());
        }
        if let Some(caps) = priority_re().captures(body) {
            data.priority = Some(caps[1].trim().to_string());
        }
        if let Some(caps) = assignee_re().captures(body) {
            data.assignee = Some(caps[1].trim().to_string());
        }
        if let Some(caps) = reporter_re().captures(body) {
            data.reporter = Some(caps[1].trim().to_string());
        }
        if let Some(caps) = comment_re().captures(body) {
            data.comment = Some(caps[1].trim().to_string());
        }

        let snapshot = serde_json::to_value(&data).unwrap_or(Value::Null);
        ctx.enrichment.extracted_data.jira = Some(data);
        Ok(ProcessorOutcome::Applied(snapshot))
    }
}

impl TypedProcessor for JiraExtractor {
    fn subtypes(&self) -> &[&'static str] {
        &["notification/jira"]
    }
}

fn extract_ticket_key(subject: &str, body: &str) -> Option<String> {
    ticket_key_re()
        .captures(subject)
        .or_else(|| ticket_key_re().captures(body))
        .map(|c| c[1].to_string())
}

fn strip_ticket_prefix(subject: &str) -> String {
    ticket_key_re()
        .replace(subject, "")
        .trim()
        .trim_start_matches(['-', ':'])
        .trim()
        .to_string()
}

fn detect_change_type(subject: &str) -> Option<String> {
    let lower = subject.to_lowercase();
    CHANGE_KEYWORDS
        .iter()
        .find(|(kw, _)| lower.contains(kw))
        .map(|(_, change)| change.to_string())
}
