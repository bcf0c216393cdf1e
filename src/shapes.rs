//! Multi-shape metadata field accessors (spec.md §9).
//!
//! `references`, `attendees`, `attachments` and similar metadata fields can
//! arrive as a native array, an array of heterogeneous map values, or a
//! JSON-encoded string (a known on-wire artifact — some connectors double
//! -encode these). Every accessor here tries, in order: array-of-strings,
//! array-of-any (stringifying non-string scalars), a single string (parsed
//! as JSON if it looks like an array literal), else empty. Never assume a
//! single shape.

use serde_json::Value;

/// Coerce a metadata field into a list of strings regardless of its shape.
pub fn as_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_to_string)
            .collect(),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.starts_with('[') {
                match serde_json::from_str::<Vec<Value>>(trimmed) {
                    Ok(items) => items.iter().filter_map(scalar_to_string).collect(),
                    Err(_) => single_string_to_list(trimmed),
                }
            } else {
                single_string_to_list(trimmed)
            }
        }
        Some(other) => scalar_to_string(other).into_iter().collect(),
    }
}

/// A bare (non-array, non-JSON-literal) string field: space-separated
/// tokens, as seen in raw `References` headers.
fn single_string_to_list(s: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }
    s.split_whitespace().map(|t| t.to_string()).collect()
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => {
            // array-of-any: take the first string-valued field as a best effort.
            map.values().find_map(|v| v.as_str()).map(|s| s.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn native_array_of_strings() {
        let v = json!(["<a>", "<b>"]);
        assert_eq!(as_string_list(Some(&v)), vec!["<a>", "<b>"]);
    }

    #[test]
    fn json_encoded_string_artifact() {
        let v = json!("[\"<a>\",\"<b>\"]");
        assert_eq!(as_string_list(Some(&v)), vec!["<a>", "<b>"]);
    }

    #[test]
    fn space_separated_string() {
        let v = json!("<a> <b>");
        assert_eq!(as_string_list(Some(&v)), vec!["<a>", "<b>"]);
    }

    #[test]
    fn array_of_any_with_objects() {
        let v = json!([{"email": "a@x.com"}, "b@x.com"]);
        assert_eq!(as_string_list(Some(&v)), vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn missing_field_is_empty() {
        assert_eq!(as_string_list(None), Vec::<String>::new());
    }

    #[test]
    fn malformed_json_array_falls_back_to_whitespace_split() {
        let v = json!("[<a>, <b>");
        assert_eq!(as_string_list(Some(&v)), vec!["[<a>,", "<b>"]);
    }
}
