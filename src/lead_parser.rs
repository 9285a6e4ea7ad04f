//! Best-effort repair and parsing of language-model output.
//!
//! [`sanitize_model_output`] applies a fixed, total set of rewrites:
//!
//! 1. strip Markdown code fences and surrounding whitespace,
//! 2. remove C0/C1 control characters (U+0000..U+001F, U+007F..U+009F),
//! 3. drop trailing commas before `]` or `}`,
//! 4. turn single-quoted values after a colon into double-quoted ones.
//!
//! Nothing else is rewritten.

use crate::errors::{AppError, ParseFailure};
use crate::models::LeadRecord;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn code_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(?:json|JSON)?[ \t]*\r?\n?").expect("valid regex"))
}

fn control_char_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\x00-\x1F\x7F-\x9F]").expect("valid regex"))
}

fn trailing_comma_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\s*([\]}])").expect("valid regex"))
}

fn single_quoted_value_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":\s*'([^']*)'").expect("valid regex"))
}

/// Normalizes raw model text into something `serde_json` can usually parse.
pub fn sanitize_model_output(raw: &str) -> String {
    let unfenced = code_fence_regex().replace_all(raw, "");
    let trimmed = unfenced.trim();
    let no_controls = control_char_regex().replace_all(trimmed, "");
    let no_trailing = trailing_comma_regex().replace_all(&no_controls, "$1");
    single_quoted_value_regex()
        .replace_all(&no_trailing, r#": "$1""#)
        .into_owned()
}

/// Sanitizes and parses model text into a JSON array.
///
/// Errors carry no model text; the caller logs it.
pub fn parse_json_array(raw: &str) -> Result<Vec<Value>, ParseFailure> {
    let cleaned = sanitize_model_output(raw);
    let value: Value = serde_json::from_str(&cleaned).map_err(|e| {
        tracing::debug!("Model output is not valid JSON after sanitizing: {}", e);
        ParseFailure::InvalidJson
    })?;

    match value {
        Value::Array(items) => Ok(items),
        _ => Err(ParseFailure::UnexpectedFormat),
    }
}

/// Parses model text into lead records, dropping records with no real value.
pub fn parse_lead_records(raw: &str) -> Result<Vec<LeadRecord>, AppError> {
    let items = parse_json_array(raw).map_err(|failure| {
        tracing::warn!("Raw model response (unparseable): {}", raw);
        AppError::Parse(failure)
    })?;

    let total = items.len();
    let mut leads = Vec::with_capacity(total);
    for item in items {
        if !item.is_object() {
            tracing::warn!("Raw model response (non-object element): {}", raw);
            return Err(AppError::Parse(ParseFailure::UnexpectedFormat));
        }
        let record: LeadRecord = serde_json::from_value(item).map_err(|e| {
            tracing::warn!("Lead record did not deserialize: {}; raw: {}", e, raw);
            AppError::Parse(ParseFailure::UnexpectedFormat)
        })?;
        if record.has_any_value() {
            leads.push(record);
        }
    }

    if leads.len() < total {
        tracing::debug!(
            "Dropped {} of {} model records with every field N/A",
            total - leads.len(),
            total
        );
    }

    Ok(leads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trailing_comma_removed() {
        assert_eq!(sanitize_model_output(r#"[{"a":1,}]"#), r#"[{"a":1}]"#);
        assert_eq!(sanitize_model_output("[1, 2,\n ]"), "[1, 2]");
    }

    #[test]
    fn test_control_characters_removed() {
        assert_eq!(
            sanitize_model_output("[{\"a\":\u{0007}\"b\u{0085}\"}]"),
            r#"[{"a":"b"}]"#
        );
    }

    #[test]
    fn test_single_quoted_values_normalized() {
        assert_eq!(
            sanitize_model_output(r#"{"Name": 'N/A'}"#),
            r#"{"Name": "N/A"}"#
        );
    }

    #[test]
    fn test_code_fences_stripped() {
        let raw = "```json\n[{\"a\": 1}]\n```";
        assert_eq!(sanitize_model_output(raw), r#"[{"a": 1}]"#);
    }

    #[test]
    fn test_parse_json_array_after_repair() {
        let items = parse_json_array(r#"[{"a":1,}]"#).unwrap();
        assert_eq!(items, vec![json!({"a": 1})]);
    }

    #[test]
    fn test_parse_json_array_rejects_non_array() {
        assert_eq!(
            parse_json_array(r#"{"Name": "John"}"#),
            Err(ParseFailure::UnexpectedFormat)
        );
        assert_eq!(
            parse_json_array("Sorry, I cannot help with that."),
            Err(ParseFailure::InvalidJson)
        );
    }

    #[test]
    fn test_parse_lead_records_filters_all_sentinel() {
        let raw = r#"[
            {"Name": "N/A", "BusinessName": "N/A", "Email": "N/A", "SocialMediaHandleLink": "N/A"},
            {"Name": "Ana", "BusinessName": "N/A", "Email": "N/A", "SocialMediaHandleLink": "N/A"}
        ]"#;

        let leads = parse_lead_records(raw).unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].name, "Ana");
    }

    #[test]
    fn test_parse_lead_records_rejects_non_object_elements() {
        let err = parse_lead_records(r#"["John", "Jane"]"#).unwrap_err();
        assert_eq!(err, AppError::Parse(ParseFailure::UnexpectedFormat));
    }
}
