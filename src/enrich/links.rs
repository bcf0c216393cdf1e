//! Link extractor (spec.md §4.3): scans the body for URLs, deduplicates,
//! categorizes, and extracts a service-specific id where known.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::ProcessorError;
use crate::model::{ExtractedLink, LinkCategory, Stage};
use crate::registry::{Processor, ProcessorContext, ProcessorOutcome};

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s<>\x22\x27]+").expect("url regex must compile"))
}

fn href_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<a\b[^>]*href=["']([^"']+)["'][^>]*>(.*?)</a>"#)
            .expect("href regex must compile")
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag regex must compile"))
}

const DEFAULT_CONTEXT_CHARS: usize = 100;
const SIGNATURE_FRACTION: f64 = 0.8;
const SIGNATURE_MARKERS: &[&str] = &["-- ", "best regards", "sent from my", "kind regards"];

pub struct LinkExtractor {
    pub context_chars: usize,
    pub extract_from_signatures: bool,
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self {
            context_chars: DEFAULT_CONTEXT_CHARS,
            extract_from_signatures: true,
        }
    }
}

impl Processor for LinkExtractor {
    fn name(&self) -> &str {
        "link_extractor"
    }

    fn stage(&self) -> Stage {
        Stage::CommonEnrichment
    }

    fn process(&self, ctx: &mut ProcessorContext<'_>) -> Result<ProcessorOutcome, ProcessorError> {
        let body = ctx.body;
        let signature_start = signature_boundary(body);

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for m in url_re().find_iter(body) {
            let url = trim_trailing_punct(m.as_str());
            if !self.accept(url, m.start(), signature_start) {
                continue;
            }
            if !seen.insert(url_hash(url)) {
                continue;
            }
            links.push(build_link(
                url,
                context_window(body, m.start(), m.end(), self.context_chars),
                None,
                false,
                "body",
            ));
        }

        let html_body = ctx
            .source
            .metadata
            .get("body_html")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let html_sig_start = signature_boundary(html_body);
        for caps in href_re().captures_iter(html_body) {
            let href = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let raw_anchor = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            let anchor = tag_re().replace_all(raw_anchor, "").trim().to_string();
            let start = caps.get(1).map(|m| m.start()).unwrap_or(0);
            if !self.accept(href, start, html_sig_start) {
                continue;
            }
            if !seen.insert(url_hash(href)) {
                continue;
            }
            let anchor = if anchor.is_empty() { None } else { Some(anchor) };
            links.push(build_link(
                href,
                context_window(html_body, start, start + href.len(), self.context_chars),
                anchor,
                true,
                "body_html",
            ));
        }

        let snapshot = serde_json::to_value(&links).unwrap_or(Value::Null);
        ctx.enrichment.extracted_links = links;
        Ok(ProcessorOutcome::Applied(snapshot))
    }
}

impl LinkExtractor {
    fn accept(&self, url: &str, offset: usize, signature_start: Option<usize>) -> bool {
        let lower = url.to_lowercase();
        if lower.starts_with("mailto:") || lower.starts_with("javascript:") {
            return false;
        }
        if !self.extract_from_signatures {
            if let Some(boundary) = signature_start {
                if offset >= boundary {
                    return false;
                }
            }
        }
        true
    }
}

/// Returns the byte offset at which the body's signature block begins, if
/// a signature marker is found, or the 80%-of-length boundary otherwise.
fn signature_boundary(body: &str) -> Option<usize> {
    let lower = body.to_lowercase();
    for marker in SIGNATURE_MARKERS {
        if let Some(pos) = lower.find(marker) {
            return Some(pos);
        }
    }
    if body.is_empty() {
        return None;
    }
    Some((body.len() as f64 * SIGNATURE_FRACTION) as usize)
}

fn trim_trailing_punct(url: &str) -> &str {
    url.trim_end_matches(|c: char| matches!(c, '.' | ',' | ')' | ']' | '>' | ';' | '!' | '?'))
}

fn context_window(body: &str, start: usize, end: usize, n: usize) -> String {
    let lo = start.saturating_sub(n);
    let hi = (end + n).min(body.len());
    let lo = floor_char_boundary(body, lo);
    let hi = ceil_char_boundary(body, hi);
    body[lo..hi].trim().to_string()
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

fn url_hash(url: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.finalize().into()
}

fn build_link(
    url: &str,
    context: String,
    anchor_text: Option<String>,
    is_inline: bool,
    source_field: &str,
) -> ExtractedLink {
    let (category, service_id) = categorize(url);
    ExtractedLink {
        url: url.to_string(),
        category,
        service_id,
        context,
        anchor_text,
        is_inline,
        source_field: source_field.to_string(),
    }
}

fn categorize(url: &str) -> (LinkCategory, Option<String>) {
    let lower = url.to_lowercase();

    if lower.contains("docs.google.com/document") {
        return (LinkCategory::GoogleDoc, extract_google_doc_id(url));
    }
    if lower.contains("docs.google.com/spreadsheets") {
        return (LinkCategory::GoogleSheet, extract_google_doc_id(url));
    }
    if lower.contains("docs.google.com/presentation") {
        return (LinkCategory::GoogleSlides, extract_google_doc_id(url));
    }
    if lower.contains("drive.google.com") {
        return (LinkCategory::GoogleDrive, extract_google_doc_id(url));
    }
    if lower.contains("/browse/") && (lower.contains("atlassian.net") || lower.contains("jira")) {
        return (LinkCategory::JiraTicket, extract_jira_key(url));
    }
    if lower.contains("atlassian.net") && (lower.contains("/jira/") || lower.contains("board")) {
        return (LinkCategory::JiraBoard, None);
    }
    if lower.contains("confluence") || lower.contains("/wiki/") {
        return (LinkCategory::Confluence, None);
    }
    if lower.contains("webex.com") && (lower.contains("recording") || lower.contains("/rec")) {
        return (LinkCategory::WebexRecording, None);
    }
    if lower.contains("zoom.us") && lower.contains("rec") {
        return (LinkCategory::ZoomRecording, None);
    }
    if lower.contains("sharepoint.com") {
        return (LinkCategory::Sharepoint, None);
    }
    if lower.contains("onedrive") || lower.contains("1drv.ms") {
        return (LinkCategory::Onedrive, None);
    }
    if lower.contains("github.com") {
        return (LinkCategory::Github, extract_owner_repo(url, "github.com"));
    }
    if lower.contains("gitlab.com") {
        return (LinkCategory::Gitlab, extract_owner_repo(url, "gitlab.com"));
    }
    if lower.contains("bitbucket.org") {
        return (LinkCategory::Bitbucket, extract_owner_repo(url, "bitbucket.org"));
    }
    if lower.contains("slack.com") {
        return (LinkCategory::Slack, None);
    }
    if lower.contains("teams.microsoft.com") {
        return (LinkCategory::Teams, None);
    }
    (LinkCategory::GenericUrl, None)
}

fn extract_google_doc_id(url: &str) -> Option<String> {
    let marker = "/d/";
    let pos = url.find(marker)? + marker.len();
    let rest = &url[pos..];
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let id = &rest[..end];
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

fn extract_jira_key(url: &str) -> Option<String> {
    fn key_re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"[A-Z]{2,10}-\d+").expect("jira key regex must compile"))
    }
    key_re().find(url).map(|m| m.as_str().to_string())
}

fn extract_owner_repo(url: &str, host: &str) -> Option<String> {
    let pos = url.find(host)? + host.len();
    let rest = url[pos..].trim_start_matches('/');
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    let path = &rest[..end];
    let mut parts = path.split('/').filter(|s| !s.is_empty());
    let owner = parts.next()?;
    let repo = parts.next()?;
    Some(format!("{owner}/{repo}"))
}
