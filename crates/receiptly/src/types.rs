use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ReceiptlyError;

// ============================================================================
// Extraction results
// ============================================================================

/// A single extracted receipt field.
///
/// The model output has no fixed schema, so values stay dynamically typed.
/// The prompt asks for strings; numbers are kept as numbers when the model
/// emits them, and anything non-scalar is carried through untouched so the
/// decoded map always equals what the model produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
    Structured(serde_json::Value),
}

impl FieldValue {
    /// The value as a string slice, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Number(number) => write!(f, "{number}"),
            FieldValue::Structured(value) => write!(f, "{value}"),
        }
    }
}

/// Extracted fields in the order the model (or the mock record) produced them.
pub type ExtractedData = IndexMap<String, FieldValue>;

/// Terminal status of one extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingStatus {
    Success,
    Error,
}

/// Result of one pass through the extraction pipeline.
///
/// Serialized in camelCase so both deployment faces return the same JSON:
/// `extractedData`, `processingStatus`, `processedAt`, `errorMessage?`.
///
/// `status == Error` always carries an `error_message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub extracted_data: ExtractedData,

    #[serde(rename = "processingStatus")]
    pub status: ProcessingStatus,

    pub processed_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Degraded-path notices (lossy transport decoding, unparseable model reply).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ExtractionResult {
    /// Successful extraction stamped with the current time.
    pub fn success(extracted_data: ExtractedData) -> Self {
        Self {
            extracted_data,
            status: ProcessingStatus::Success,
            processed_at: Utc::now(),
            error_message: None,
            warnings: Vec::new(),
        }
    }

    /// Failed extraction with an empty payload.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            extracted_data: ExtractedData::new(),
            status: ProcessingStatus::Error,
            processed_at: Utc::now(),
            error_message: Some(message.into()),
            warnings: Vec::new(),
        }
    }

    /// Failed extraction carrying only the caller-safe message of `err`.
    pub fn from_error(err: &ReceiptlyError) -> Self {
        Self::failure(err.public_message())
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ProcessingStatus::Success
    }
}

// ============================================================================
// Request-scoped inputs
// ============================================================================

/// How the raw request body must be decoded into image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportHint {
    /// Body is the image itself.
    RawBinary,
    /// The gateway base64-encoded the binary body.
    GatewayBase64,
    /// The client base64-encoded the file and said so in a header.
    PreEncodedBase64,
}

/// Request body as the transport handed it over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPayload {
    Bytes(Vec<u8>),
    Text(String),
}

impl RawPayload {
    pub fn len(&self) -> usize {
        match self {
            RawPayload::Bytes(bytes) => bytes.len(),
            RawPayload::Text(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<u8>> for RawPayload {
    fn from(bytes: Vec<u8>) -> Self {
        RawPayload::Bytes(bytes)
    }
}

impl From<String> for RawPayload {
    fn from(text: String) -> Self {
        RawPayload::Text(text)
    }
}

/// Everything a deployment face knows about one upload.
#[derive(Debug, Clone)]
pub struct ExtractionInput {
    pub payload: RawPayload,
    pub hint: TransportHint,
    /// Original filename. `None` for bare request bodies, which have no name
    /// and are therefore exempt from the extension allow-list.
    pub filename: Option<String>,
    pub declared_content_type: Option<String>,
}

impl ExtractionInput {
    /// A named multipart upload whose bytes are already binary.
    pub fn upload(bytes: Vec<u8>, filename: impl Into<String>, content_type: Option<String>) -> Self {
        Self {
            payload: RawPayload::Bytes(bytes),
            hint: TransportHint::RawBinary,
            filename: Some(filename.into()),
            declared_content_type: content_type,
        }
    }

    /// An unnamed request body with the given transport hint.
    pub fn body(payload: impl Into<RawPayload>, hint: TransportHint) -> Self {
        Self {
            payload: payload.into(),
            hint,
            filename: None,
            declared_content_type: None,
        }
    }
}

/// A decoded upload, ready for validation. Never persisted.
#[derive(Debug, Clone)]
pub struct UploadDescriptor {
    pub filename: Option<String>,
    pub declared_content_type: Option<String>,
    pub size_bytes: u64,
    pub bytes: Vec<u8>,
}

impl UploadDescriptor {
    pub fn new(bytes: Vec<u8>, filename: Option<String>, declared_content_type: Option<String>) -> Self {
        Self {
            filename,
            declared_content_type,
            size_bytes: bytes.len() as u64,
            bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_serializes_camel_case() {
        let mut data = ExtractedData::new();
        data.insert("total".to_string(), "9.50".into());
        let result = ExtractionResult::success(data);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["extractedData"]["total"], "9.50");
        assert_eq!(value["processingStatus"], "Success");
        assert!(value["processedAt"].is_string());
        assert!(value.get("errorMessage").is_none());
        assert!(value.get("warnings").is_none());
    }

    #[test]
    fn test_failure_carries_message() {
        let result = ExtractionResult::failure("No file provided");
        assert_eq!(result.status, ProcessingStatus::Error);
        assert_eq!(result.error_message.as_deref(), Some("No file provided"));
        assert!(result.extracted_data.is_empty());

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["processingStatus"], "Error");
        assert_eq!(value["errorMessage"], "No file provided");
    }

    #[test]
    fn test_field_value_untagged_roundtrip() {
        let data: ExtractedData = serde_json::from_value(json!({
            "business_name": "Coffee Corner",
            "total": 8.37,
            "items": ["a", "b"],
            "paid": true
        }))
        .unwrap();

        assert_eq!(data["business_name"], FieldValue::Text("Coffee Corner".to_string()));
        assert!(matches!(data["total"], FieldValue::Number(_)));
        assert!(matches!(data["items"], FieldValue::Structured(_)));
        assert!(matches!(data["paid"], FieldValue::Structured(_)));

        let keys: Vec<_> = data.keys().cloned().collect();
        assert_eq!(keys, vec!["business_name", "total", "items", "paid"]);
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::from("4.50").to_string(), "4.50");
        assert_eq!(FieldValue::Number(serde_json::Number::from(3)).to_string(), "3");
    }

    #[test]
    fn test_raw_payload_len() {
        assert!(RawPayload::Bytes(Vec::new()).is_empty());
        assert_eq!(RawPayload::Text("abc".to_string()).len(), 3);
    }
}
