//! Source-system classification rules (spec.md §4.2).
//!
//! Independent of content-type classification: every `Source` gets exactly
//! one of these tags, first match wins.

use super::ClassifierInput;
use crate::model::SourceSystem;

pub(super) fn classify(input: &ClassifierInput) -> SourceSystem {
    if is_jira(input) {
        return SourceSystem::Jira;
    }
    if is_aha(input) {
        return SourceSystem::Aha;
    }
    if is_google_docs(input) {
        return SourceSystem::GoogleDocs;
    }
    if input.from == "messenger@webex.com" {
        return SourceSystem::Webex;
    }
    if is_smartsheet(input) {
        return SourceSystem::Smartsheet;
    }
    if input.subject.starts_with("automatic reply:") {
        return SourceSystem::AutoReply;
    }
    if is_outlook_calendar(input) {
        return SourceSystem::OutlookCalendar;
    }
    SourceSystem::HumanEmail
}

fn is_jira(input: &ClassifierInput) -> bool {
    input.from.contains("jira")
        || input.subject.starts_with("[track-jira]")
        || input.message_id.contains("@atlassian.jira")
}

fn is_aha(input: &ClassifierInput) -> bool {
    super::wildcard::wildcard_match("*@*.mailer.aha.io", &input.from)
        || input.subject.starts_with("[aha]")
}

fn is_google_docs(input: &ClassifierInput) -> bool {
    super::wildcard::wildcard_match("*-noreply@docs.google.com", &input.from)
        || input.from == "drive-shares-dm-noreply@google.com"
}

fn is_smartsheet(input: &ClassifierInput) -> bool {
    super::wildcard::wildcard_match("*@*.smartsheet.com", &input.from)
}

fn is_outlook_calendar(input: &ClassifierInput) -> bool {
    if input.subject.starts_with("canceled:") || input.subject.starts_with("cancelled:") {
        return true;
    }
    input
        .header("content-type")
        .map_or(false, |v| v.contains("text/calendar"))
}
