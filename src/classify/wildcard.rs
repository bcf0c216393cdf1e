//! `*`-wildcard matching for classification rules (spec.md §4.2).
//!
//! `*` means "any run of characters". Patterns of the form
//! `prefix@*.suffix.dom` must match the literal prefix, then any interior
//! run, then the literal suffix, in order — a plain substring search would
//! wrongly accept `prefix@suffix.dom` (no interior run at all) or match the
//! wrong occurrence when the suffix also appears earlier in the string.

/// Returns true if `text` matches `pattern`, where `*` in `pattern` matches
/// any (possibly empty) run of characters. Case-sensitive; callers are
/// expected to lowercase both sides first, matching the classifier's
/// case-insensitive rule evaluation.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    if segments.len() == 1 {
        return pattern == text;
    }

    let mut cursor = 0usize;
    let anchored_start = !pattern.starts_with('*');
    let anchored_end = !pattern.ends_with('*');

    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        let is_first = i == 0;
        let is_last = i == segments.len() - 1;

        if is_first && anchored_start {
            if !text[cursor..].starts_with(segment) {
                return false;
            }
            cursor += segment.len();
            continue;
        }
        if is_last && anchored_end {
            return text[cursor..].ends_with(segment);
        }

        match text[cursor..].find(segment) {
            Some(pos) => cursor += pos + segment.len(),
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_prefix_interior_suffix() {
        assert!(wildcard_match(
            "noreply@*.mailer.aha.io",
            "noreply@updates.mailer.aha.io"
        ));
    }

    #[test]
    fn rejects_missing_interior_run_when_required() {
        // "*-noreply@docs.google.com" requires *some* prefix before "-noreply".
        assert!(!wildcard_match(
            "*-noreply@docs.google.com",
            "noreply@docs.google.com"
        ));
    }

    #[test]
    fn matches_suffix_only_wildcard() {
        assert!(wildcard_match(
            "*-noreply@docs.google.com",
            "drive-noreply@docs.google.com"
        ));
    }

    #[test]
    fn exact_match_without_wildcard() {
        assert!(wildcard_match(
            "messenger@webex.com",
            "messenger@webex.com"
        ));
        assert!(!wildcard_match("messenger@webex.com", "other@webex.com"));
    }

    #[test]
    fn matches_interior_wildcard_for_smartsheet() {
        assert!(wildcard_match(
            "*@*.smartsheet.com",
            "notify@app.smartsheet.com"
        ));
        assert!(!wildcard_match("*@*.smartsheet.com", "notify@smartsheet.com"));
    }
}
