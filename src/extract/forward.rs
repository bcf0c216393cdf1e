//! Forward unwrap (spec.md §4.4), owns subtype `email/forward`.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ProcessorError;
use crate::model::Stage;
use crate::registry::{Processor, ProcessorContext, ProcessorOutcome, TypedProcessor};

pub struct ForwardUnwrap;

fn forwarded_from_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^\s*from:\s*(.+)$").expect("forwarded-from regex must compile")
    })
}

impl Processor for ForwardUnwrap {
    fn name(&self) -> &str {
        "forward_unwrap"
    }

    fn stage(&self) -> Stage {
        Stage::TypeExtraction
    }

    fn process(&self, ctx: &mut ProcessorContext<'_>) -> Result<ProcessorOutcome, ProcessorError> {
        let forwarded_from = forwarded_from_re()
            .captures(ctx.body)
            .map(|c| c[1].trim().to_string());

        match forwarded_from {
            Some(from) => {
                ctx.enrichment.extracted_data.forwarded_from = Some(from.clone());
                Ok(ProcessorOutcome::Applied(Value::String(from)))
            }
            None => Ok(ProcessorOutcome::NotApplicable),
        }
    }
}

impl TypedProcessor for ForwardUnwrap {
    fn subtypes(&self) -> &[&'static str] {
        &["email/forward"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_forwarded_from_line() {
        let body = "---------- Forwarded message ----------\nFrom: Jane Doe <jane@acme.com>\nDate: ...";
        let caps = forwarded_from_re().captures(body).unwrap();
        assert_eq!(caps[1].trim(), "Jane Doe <jane@acme.com>");
    }

    #[test]
    fn no_match_when_no_from_line() {
        assert!(forwarded_from_re().captures("just a plain forwarded note").is_none());
    }
}
