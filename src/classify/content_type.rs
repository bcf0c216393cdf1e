//! Content-type classification rules, in priority order (spec.md §4.2).
//! 1 = highest priority; first match wins.

use super::ClassifierInput;
use crate::model::{ContentType, ProcessingProfile};

type Rule = (ContentType, &'static str, ProcessingProfile, &'static str, &'static str, u32);

pub(super) fn classify(input: &ClassifierInput) -> Rule {
    if input.has_calendar_attachment {
        return classify_calendar(input);
    }

    if is_jira_notification(input) {
        return (
            ContentType::Other,
            "notification/jira",
            ProcessingProfile::MetadataOnly,
            "jira_notification",
            "from contains 'jira' and an auto-generation signal is present",
            2,
        );
    }

    if is_google_docs_notification(input) {
        return (
            ContentType::Other,
            "notification/google",
            ProcessingProfile::MetadataOnly,
            "google_notification",
            "from matches Google Docs notification patterns",
            3,
        );
    }

    if is_slack_notification(input) {
        return (
            ContentType::Other,
            "notification/slack",
            ProcessingProfile::MetadataOnly,
            "slack_notification",
            "from contains 'slack' or '@slack.com'",
            4,
        );
    }

    if input.has_any_auto_header() {
        return (
            ContentType::Other,
            "notification/other",
            ProcessingProfile::MetadataOnly,
            "generic_auto_notification",
            "an auto-generation header is present",
            5,
        );
    }

    if starts_with_any(&input.subject, &["fw:", "fwd:"]) {
        return (
            ContentType::Email,
            "email/forward",
            ProcessingProfile::FullAi,
            "forward_subject_prefix",
            "subject begins with a forward prefix",
            6,
        );
    }

    if input.has_in_reply_to || input.has_references {
        return (
            ContentType::Email,
            "email/thread",
            ProcessingProfile::FullAi,
            "in_reply_to_or_references_present",
            "In-Reply-To or References header present",
            7,
        );
    }

    (
        ContentType::Email,
        "email/standalone",
        ProcessingProfile::FullAi,
        "default_standalone",
        "no higher-priority rule matched",
        8,
    )
}

// ---------------------------------------------------------------------
// Rule 1: calendar
// ---------------------------------------------------------------------

fn classify_calendar(input: &ClassifierInput) -> Rule {
    if starts_with_any(&input.subject, &["canceled:", "cancelled:"]) {
        return (
            ContentType::Calendar,
            "calendar/cancellation",
            ProcessingProfile::StateTracking,
            "calendar_cancellation",
            "calendar attachment/content-type with a cancellation subject prefix",
            1,
        );
    }
    if starts_with_any(&input.subject, &["accepted:", "declined:", "tentative:"]) {
        return (
            ContentType::Calendar,
            "calendar/response",
            ProcessingProfile::StateTracking,
            "calendar_response",
            "calendar attachment/content-type with a response subject prefix",
            1,
        );
    }
    if input.subject.starts_with("updated:") {
        return (
            ContentType::Calendar,
            "calendar/update",
            ProcessingProfile::StateTracking,
            "calendar_update",
            "calendar attachment with an 'Updated:' subject prefix",
            1,
        );
    }
    (
        ContentType::Calendar,
        "calendar/invite",
        ProcessingProfile::StateTracking,
        "calendar_invite",
        "calendar attachment or text/calendar content-type, no recognized status prefix",
        1,
    )
}

// ---------------------------------------------------------------------
// Rules 2-5: notifications
// ---------------------------------------------------------------------

fn is_jira_notification(input: &ClassifierInput) -> bool {
    input.from.contains("jira")
        && (input.header("auto-submitted").is_some()
            || input.header("precedence").map_or(false, |v| v == "bulk"))
}

fn is_google_docs_notification(input: &ClassifierInput) -> bool {
    // Open question in spec.md §9: the source's written form is ambiguous
    // operator-precedence-wise. Implemented as documented there:
    // (from ~ "*-noreply@docs.google.com") OR ("@google.com" in from AND "noreply" in from)
    super::wildcard::wildcard_match("*-noreply@docs.google.com", &input.from)
        || (input.from.contains("@google.com") && input.from.contains("noreply"))
}

fn is_slack_notification(input: &ClassifierInput) -> bool {
    input.from.contains("slack") || input.from.contains("@slack.com")
}

fn starts_with_any(haystack: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| haystack.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn input(subject: &str, from: &str) -> ClassifierInput {
        ClassifierInput {
            subject: subject.to_lowercase(),
            from: from.to_lowercase(),
            message_id: String::new(),
            headers: HashMap::new(),
            has_calendar_attachment: false,
            attachment_filenames: Vec::new(),
            has_in_reply_to: false,
            has_references: false,
        }
    }

    #[test]
    fn google_docs_notification_wildcard_branch() {
        assert!(is_google_docs_notification(&input(
            "",
            "drive-shares-dm-noreply@docs.google.com"
        )));
    }

    #[test]
    fn google_docs_notification_and_branch() {
        assert!(is_google_docs_notification(&input(
            "",
            "noreply-updates@google.com"
        )));
        assert!(!is_google_docs_notification(&input(
            "",
            "someone@google.com"
        )));
    }

    #[test]
    fn jira_requires_auto_signal() {
        let mut with_header = input("", "jira@acme.atlassian.net");
        with_header
            .headers
            .insert("auto-submitted".into(), "auto-generated".into());
        assert!(is_jira_notification(&with_header));

        let without_header = input("", "jira@acme.atlassian.net");
        assert!(!is_jira_notification(&without_header));
    }
}
