//! Calendar extractor (spec.md §4.4), owns all `calendar/*` subtypes.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ProcessorError;
use crate::model::{uuid_like, MeetingData, Stage};
use crate::registry::{Processor, ProcessorContext, ProcessorOutcome, TypedProcessor};

const SUBJECT_PREFIXES: &[&str] = &[
    "canceled:",
    "cancelled:",
    "accepted:",
    "declined:",
    "tentative:",
    "updated:",
];

pub struct CalendarExtractor;

fn uid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)UID[:\s]+([^\s\r\n]+)").expect("uid regex must compile"))
}

fn video_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"https?://[^\s<>]*(?:webex\.com|zoom\.us|meet\.google\.com|teams\.microsoft\.com)[^\s<>]*",
        )
        .expect("video url regex must compile")
    })
}

impl Processor for CalendarExtractor {
    fn name(&self) -> &str {
        "calendar_extractor"
    }

    fn stage(&self) -> Stage {
        Stage::TypeExtraction
    }

    fn process(&self, ctx: &mut ProcessorContext<'_>) -> Result<ProcessorOutcome, ProcessorError> {
        let subject = ctx.source.metadata_str("subject").unwrap_or_default();
        let body = ctx.body;
        let meta = &ctx.source.metadata;

        let title = strip_calendar_prefix(subject);

        let ical_uid = uid_re()
            .captures(body)
            .map(|c| c[1].to_string())
            .or_else(|| meta.get("ical_uid").and_then(|v| v.as_str()).map(str::to_string));

        let (organizer_name, organizer_email) = extract_organizer(meta);

        let attendees = meta
            .get("attendees")
            .map(crate::shapes::as_string_list)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| {
                let mut combined = crate::shapes::as_string_list(meta.get("to"));
                combined.extend(crate::shapes::as_string_list(meta.get("cc")));
                combined
            });

        let video_url = video_url_re().find(body).map(|m| m.as_str().to_string());

        let subtype = ctx
            .enrichment
            .classification
            .as_ref()
            .map(|c| c.subtype.as_str())
            .unwrap_or("calendar/invite");
        let (event_type, status) = event_type_and_status(subtype);

        let fallback_seed = format!(
            "{}:{}",
            organizer_email.clone().unwrap_or_default(),
            meta.get("start_time").and_then(|v| v.as_str()).unwrap_or_default()
        );
        let ical_uid = ical_uid.or_else(|| Some(uuid_like(&fallback_seed, "ics")));

        let data = MeetingData {
            title: Some(title),
            ical_uid,
            organizer_name,
            organizer_email,
            attendees,
            video_url,
            event_type,
            status,
        };

        let snapshot = serde_json::to_value(&data).unwrap_or(Value::Null);
        ctx.enrichment.extracted_data.meeting = Some(data);
        Ok(ProcessorOutcome::Applied(snapshot))
    }
}

impl TypedProcessor for CalendarExtractor {
    fn subtypes(&self) -> &[&'static str] {
        &[
            "calendar/invite",
            "calendar/cancellation",
            "calendar/response",
            "calendar/update",
        ]
    }
}

fn strip_calendar_prefix(subject: &str) -> String {
    let lower = subject.to_lowercase();
    for prefix in SUBJECT_PREFIXES {
        if let Some(stripped) = lower.strip_prefix(prefix) {
            let offset = subject.len() - stripped.len();
            return subject[offset..].trim().to_string();
        }
    }
    subject.trim().to_string()
}

fn extract_organizer(meta: &std::collections::HashMap<String, Value>) -> (Option<String>, Option<String>) {
    let raw = meta
        .get("organizer")
        .and_then(|v| v.as_str())
        .or_else(|| meta.get("from").and_then(|v| v.as_str()))
        .unwrap_or_default();

    let (name_part, email_part) = match (raw.find('<'), raw.find('>')) {
        (Some(open), Some(close)) if close > open => (raw[..open].trim(), raw[open + 1..close].trim()),
        _ => ("", raw),
    };

    let email = email_part.trim().to_lowercase();
    let email = if email.contains('@') { Some(email) } else { None };

    let name_part = name_part.trim().trim_matches('"');
    let name = if let Some((last, first)) = name_part.split_once(',') {
        let (last, first) = (last.trim(), first.trim());
        if !last.is_empty() && !first.is_empty() {
            Some(format!("{first} {last}"))
        } else {
            None
        }
    } else if !name_part.is_empty() {
        Some(name_part.to_string())
    } else {
        None
    };

    (name, email)
}

fn event_type_and_status(subtype: &str) -> (String, String) {
    match subtype {
        "calendar/cancellation" => ("meeting".to_string(), "cancelled".to_string()),
        "calendar/response" => ("meeting".to_string(), "tentative".to_string()),
        "calendar/update" => ("meeting".to_string(), "updated".to_string()),
        _ => ("meeting".to_string(), "scheduled".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_cancellation_prefix() {
        assert_eq!(strip_calendar_prefix("Canceled: Weekly Standup"), "Weekly Standup");
    }

    #[test]
    fn strips_response_prefix_case_insensitive() {
        assert_eq!(strip_calendar_prefix("ACCEPTED: Planning Sync"), "Planning Sync");
    }

    #[test]
    fn extracts_organizer_last_first() {
        let (name, email) = extract_organizer_from_str("\"Doe, Jane\" <jane@acme.com>");
        assert_eq!(name.as_deref(), Some("Jane Doe"));
        assert_eq!(email.as_deref(), Some("jane@acme.com"));
    }

    #[test]
    fn status_by_subtype() {
        assert_eq!(event_type_and_status("calendar/cancellation").1, "cancelled");
        assert_eq!(event_type_and_status("calendar/invite").1, "scheduled");
    }

    fn extract_organizer_from_str(raw: &str) -> (Option<String>, Option<String>) {
        let mut meta = std::collections::HashMap::new();
        meta.insert("organizer".to_string(), serde_json::Value::String(raw.to_string()));
        extract_organizer(&meta)
    }
}
