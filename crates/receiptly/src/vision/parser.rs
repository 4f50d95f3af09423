//! Parsing of free-form model replies into extracted fields.
//!
//! Models often wrap the requested JSON in prose or code fences. The parser
//! takes the span from the first `{` to the last `}` and decodes it; if that
//! fails the whole reply is kept under `raw_response` so a reply always yields
//! a usable result.

use crate::types::{ExtractedData, FieldValue};

/// Key used for the fallback entry.
pub const RAW_RESPONSE_KEY: &str = "raw_response";

/// Notice attached to results whose model reply could not be decoded.
pub const PARSE_DEGRADED_WARNING: &str = "Model reply was not valid JSON; returned raw text under 'raw_response'";

/// Outcome of parsing one model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub data: ExtractedData,
    /// True when the `raw_response` fallback was used.
    pub degraded: bool,
}

/// Parse a model reply into an ordered field map.
///
/// Never fails. Absent braces, braces in the wrong order or an undecodable
/// span all produce `{"raw_response": <text>}` with `degraded = true`.
pub fn parse_model_response(text: &str) -> ParsedResponse {
    if let Some(span) = json_object_span(text) {
        match serde_json::from_str::<ExtractedData>(span) {
            Ok(data) => return ParsedResponse { data, degraded: false },
            Err(e) => {
                tracing::warn!("Failed to parse model response as JSON: {}", e);
            }
        }
    } else {
        tracing::warn!("Model response contains no JSON object ({} chars)", text.len());
    }

    let mut data = ExtractedData::new();
    data.insert(RAW_RESPONSE_KEY.to_string(), FieldValue::Text(text.to_string()));
    ParsedResponse { data, degraded: true }
}

/// Substring from the first `{` through the last `}`, if they are in order.
fn json_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback(text: &str) -> ExtractedData {
        let mut data = ExtractedData::new();
        data.insert(RAW_RESPONSE_KEY.to_string(), FieldValue::Text(text.to_string()));
        data
    }

    #[test]
    fn test_json_inside_prose() {
        let parsed = parse_model_response("Sure! {\"total\":\"9.50\"} enjoy");
        assert!(!parsed.degraded);
        assert_eq!(parsed.data.len(), 1);
        assert_eq!(parsed.data["total"], FieldValue::Text("9.50".to_string()));
    }

    #[test]
    fn test_code_fenced_json_keeps_key_order() {
        let text = "```json\n{\n  \"business_name\": \"Demo\",\n  \"date\": \"2024-01-15\",\n  \"amount\": \"3\"\n}\n```";
        let parsed = parse_model_response(text);
        assert!(!parsed.degraded);
        let keys: Vec<_> = parsed.data.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["business_name", "date", "amount"]);
    }

    #[test]
    fn test_equals_direct_decode_of_span() {
        let span = r#"{"total": 12.5, "items": [{"name": "tea"}], "tax": "1.00"}"#;
        let text = format!("Here you go:\n{span}\nThanks.");
        let direct: ExtractedData = serde_json::from_str(span).unwrap();
        assert_eq!(parse_model_response(&text).data, direct);
    }

    #[test]
    fn test_no_braces_falls_back() {
        let text = "I could not read this receipt.";
        let parsed = parse_model_response(text);
        assert!(parsed.degraded);
        assert_eq!(parsed.data, fallback(text));
    }

    #[test]
    fn test_reversed_braces_fall_back() {
        let text = "} nothing here {";
        assert_eq!(parse_model_response(text).data, fallback(text));
    }

    #[test]
    fn test_invalid_json_falls_back() {
        let text = "{total: 9.50,}";
        let parsed = parse_model_response(text);
        assert!(parsed.degraded);
        assert_eq!(parsed.data, fallback(text));
    }

    #[test]
    fn test_two_objects_span_is_invalid() {
        let text = r#"{"a": "1"} and {"b": "2"}"#;
        assert_eq!(parse_model_response(text).data, fallback(text));
    }

    #[test]
    fn test_empty_object_is_not_degraded() {
        let parsed = parse_model_response("{}");
        assert!(!parsed.degraded);
        assert!(parsed.data.is_empty());
    }

    #[test]
    fn test_empty_text_falls_back() {
        assert_eq!(parse_model_response("").data, fallback(""));
    }
}
