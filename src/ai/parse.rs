//! Parses an LLM completion's raw text into the extraction schema
//! (spec.md §4.5 step 6). A bad top-level JSON body and a malformed
//! individual field both recover to an empty-but-valid output with
//! `status=partial` rather than failing the run outright, since a model
//! returning prose instead of JSON (or dropping/mangling one list)
//! shouldn't throw away everything else the pipeline has already done.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ExtractionStatus;

fn default_confidence() -> f64 {
    0.5
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionItem {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source_quote: Option<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// The name/identity text referenced by this item, if any (e.g. an
    /// action's assignee). Tagged with its slot by `role_slot_for` when the
    /// item is turned into an `Assertion` — this is the value the mention
    /// resolver later picks up.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub answered: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentimentOutput {
    #[serde(default)]
    pub overall: String,
    #[serde(flatten)]
    pub detail: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionOutput {
    #[serde(default)]
    pub risks: Vec<ExtractionItem>,
    #[serde(default)]
    pub actions: Vec<ExtractionItem>,
    #[serde(default)]
    pub issues: Vec<ExtractionItem>,
    #[serde(default)]
    pub decisions: Vec<ExtractionItem>,
    #[serde(default)]
    pub commitments: Vec<ExtractionItem>,
    #[serde(default)]
    pub questions: Vec<ExtractionItem>,
    #[serde(default)]
    pub sentiment: Option<SentimentOutput>,
}

pub struct ParseOutcome {
    pub output: Option<ExtractionOutput>,
    pub errors: Vec<String>,
    pub status: ExtractionStatus,
}

const FIELDS: &[&str] = &["risks", "actions", "issues", "decisions", "commitments", "questions"];

pub fn parse(raw: &str) -> ParseOutcome {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            return ParseOutcome {
                output: Some(ExtractionOutput::default()),
                errors: vec![format!("invalid JSON: {e}")],
                status: ExtractionStatus::Partial,
            };
        }
    };

    let mut errors = Vec::new();
    let mut output = ExtractionOutput::default();

    for field in FIELDS {
        let Some(v) = value.get(field) else { continue };
        match serde_json::from_value::<Vec<ExtractionItem>>(v.clone()) {
            Ok(items) => set_field(&mut output, field, items),
            Err(e) => errors.push(format!("field '{field}': {e}")),
        }
    }

    if let Some(v) = value.get("sentiment") {
        match serde_json::from_value::<SentimentOutput>(v.clone()) {
            Ok(s) => output.sentiment = Some(s),
            Err(e) => errors.push(format!("field 'sentiment': {e}")),
        }
    }

    let status = if errors.is_empty() {
        ExtractionStatus::Completed
    } else {
        ExtractionStatus::Partial
    };

    ParseOutcome {
        output: Some(output),
        errors,
        status,
    }
}

fn set_field(output: &mut ExtractionOutput, field: &str, items: Vec<ExtractionItem>) {
    match field {
        "risks" => output.risks = items,
        "actions" => output.actions = items,
        "issues" => output.issues = items,
        "decisions" => output.decisions = items,
        "commitments" => output.commitments = items,
        "questions" => output.questions = items,
        _ => unreachable!("field list above is exhaustive"),
    }
}
