//! Error types for Receiptly.
//!
//! All fallible operations in the library return [`ReceiptlyError`]. The enum
//! mirrors the extraction taxonomy:
//!
//! - `Upload` - the upload itself is unusable (empty, too large, wrong type)
//! - `TransportDecode` - the body could not be turned back into image bytes
//! - `Upstream` - the vision model (or the secret store) failed
//! - `Configuration` - the deployment is misconfigured
//!
//! A model reply that is not valid JSON is *not* an error; the response parser
//! degrades to a `raw_response` field instead (see [`crate::vision::parser`]).
//!
//! Every error knows the HTTP status it maps to and the message that is safe to
//! show a caller. Upstream and internal failures are reported with a generic
//! message and logged in full where they are caught.
//!
//! # Example
//!
//! ```rust
//! use receiptly::{ReceiptlyError, Result};
//!
//! fn require_body(body: &[u8]) -> Result<&[u8]> {
//!     if body.is_empty() {
//!         return Err(ReceiptlyError::validation("request body is required"));
//!     }
//!     Ok(body)
//! }
//! ```
use thiserror::Error;

/// Result type alias using `ReceiptlyError`.
pub type Result<T> = std::result::Result<T, ReceiptlyError>;

/// Generic message returned for failures whose details must not leak.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error occurred while processing the image";

/// Generic message returned when the vision model call fails.
pub const UPSTREAM_ERROR_MESSAGE: &str = "Failed to process receipt image";

/// Why an upload was rejected before any external call was made.
///
/// Checks run in declaration order and the first failure wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    /// Missing or zero-length payload.
    #[error("No file provided")]
    EmptyFile,

    /// Payload is larger than the configured policy allows.
    #[error("File size exceeds maximum allowed size of {}MB", .limit_bytes / 1024 / 1024)]
    FileTooLarge { limit_bytes: u64 },

    /// Extension missing or not on the allow-list.
    #[error("File type not supported. Allowed types: {}", .allowed.join(", "))]
    UnsupportedType { allowed: Vec<String> },
}

/// Main error type for all Receiptly operations.
#[derive(Debug, Error)]
pub enum ReceiptlyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload rejected: {0}")]
    Upload(#[from] UploadRejection),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Transport decode error: {message}")]
    TransportDecode {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Upstream error: {message}")]
    Upstream {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for ReceiptlyError {
    fn from(err: serde_json::Error) -> Self {
        ReceiptlyError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<base64::DecodeError> for ReceiptlyError {
    fn from(err: base64::DecodeError) -> Self {
        ReceiptlyError::TransportDecode {
            message: format!("invalid base64 payload: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl ReceiptlyError {
    error_constructor!(validation, Validation);
    error_constructor!(transport_decode, TransportDecode);
    error_constructor!(upstream, Upstream);
    error_constructor!(configuration, Configuration);
    error_constructor!(serialization, Serialization);

    /// Whether the caller can fix this by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ReceiptlyError::Upload(_) | ReceiptlyError::Validation { .. } | ReceiptlyError::TransportDecode { .. }
        )
    }

    /// HTTP status code both deployment faces use for this error.
    pub fn http_status(&self) -> u16 {
        if self.is_client_error() { 400 } else { 500 }
    }

    /// Message that is safe to return to a caller.
    ///
    /// User-correctable errors are reported verbatim; everything else collapses
    /// to a generic message.
    pub fn public_message(&self) -> String {
        match self {
            ReceiptlyError::Upload(rejection) => rejection.to_string(),
            ReceiptlyError::Validation { message, .. } => message.clone(),
            ReceiptlyError::TransportDecode { message, .. } => format!("Could not decode uploaded file: {message}"),
            ReceiptlyError::Upstream { .. } => UPSTREAM_ERROR_MESSAGE.to_string(),
            _ => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ReceiptlyError = io_err.into();
        assert!(matches!(err, ReceiptlyError::Io(_)));
        assert!(err.to_string().contains("IO error"));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn test_empty_file_message() {
        let err: ReceiptlyError = UploadRejection::EmptyFile.into();
        assert_eq!(err.public_message(), "No file provided");
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_file_too_large_message_in_mb() {
        let rejection = UploadRejection::FileTooLarge {
            limit_bytes: 10_485_760,
        };
        assert_eq!(rejection.to_string(), "File size exceeds maximum allowed size of 10MB");
    }

    #[test]
    fn test_unsupported_type_lists_allowed() {
        let rejection = UploadRejection::UnsupportedType {
            allowed: vec![".png".to_string(), ".jpg".to_string(), ".jpeg".to_string()],
        };
        assert_eq!(
            rejection.to_string(),
            "File type not supported. Allowed types: .png, .jpg, .jpeg"
        );
    }

    #[test]
    fn test_upstream_error_message_is_generic() {
        let err = ReceiptlyError::upstream("401 Unauthorized: invalid api key sk-live-123");
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.public_message(), UPSTREAM_ERROR_MESSAGE);
        assert!(!err.public_message().contains("sk-live"));
    }

    #[test]
    fn test_configuration_error_is_internal() {
        let err = ReceiptlyError::configuration("OPENAI_API_KEY_SECRET environment variable not set");
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn test_transport_decode_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad padding");
        let err = ReceiptlyError::transport_decode_with_source("invalid base64 payload", source);
        assert_eq!(err.to_string(), "Transport decode error: invalid base64 payload");
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_base64_error_conversion() {
        use base64::Engine;
        let b64_err = base64::engine::general_purpose::STANDARD
            .decode("not base64!!")
            .unwrap_err();
        let err: ReceiptlyError = b64_err.into();
        assert!(matches!(err, ReceiptlyError::TransportDecode { .. }));
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: ReceiptlyError = json_err.into();
        assert!(matches!(err, ReceiptlyError::Serialization { .. }));
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_other_error() {
        let err = ReceiptlyError::Other("unexpected error".to_string());
        assert_eq!(err.to_string(), "unexpected error");
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);
    }
}
