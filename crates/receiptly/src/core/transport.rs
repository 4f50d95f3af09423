//! Request body decoding.
//!
//! Turns whatever a deployment face received into the canonical image bytes,
//! according to the [`TransportHint`] the face selected.

use crate::types::{RawPayload, TransportHint};
use crate::{ReceiptlyError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Notice attached to results produced from the Latin-1 fallback path.
pub const LATIN1_FALLBACK_WARNING: &str =
    "Request body arrived as text without a base64 transport hint; bytes were recovered with a lossy Latin-1 fallback";

/// Decoded image bytes plus whether a lossy path produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    pub bytes: Vec<u8>,
    /// Set when the Latin-1 last resort was used. Non-ASCII image bytes may be corrupted.
    pub lossy: bool,
}

/// Decode `payload` into image bytes.
///
/// - `PreEncodedBase64` / `GatewayBase64`: standard base64 (whitespace ignored,
///   a leading `data:<mime>;base64,` prefix is accepted).
/// - `RawBinary`: bytes are used verbatim; text is mapped one byte per character
///   (ISO-8859-1). Characters above U+00FF cannot be represented and become `?`.
///
/// An empty result is returned as-is; rejecting it is the validator's job.
///
/// # Errors
///
/// Returns `ReceiptlyError::TransportDecode` on invalid base64.
pub fn decode_payload(payload: RawPayload, hint: TransportHint) -> Result<DecodedPayload> {
    match hint {
        TransportHint::PreEncodedBase64 | TransportHint::GatewayBase64 => {
            let text = match payload {
                RawPayload::Text(text) => text,
                RawPayload::Bytes(bytes) => String::from_utf8(bytes).map_err(|e| {
                    ReceiptlyError::transport_decode_with_source("base64 payload is not valid text", e)
                })?,
            };
            let bytes = decode_base64(&text)?;
            Ok(DecodedPayload { bytes, lossy: false })
        }
        TransportHint::RawBinary => match payload {
            RawPayload::Bytes(bytes) => Ok(DecodedPayload { bytes, lossy: false }),
            RawPayload::Text(text) => {
                tracing::warn!("Using Latin-1 fallback for body decoding ({} chars)", text.chars().count());
                Ok(DecodedPayload {
                    bytes: latin1_bytes(&text),
                    lossy: true,
                })
            }
        },
    }
}

/// Decode standard base64, tolerating whitespace and a data-URL prefix.
pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    let body = match text.trim_start().strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| ReceiptlyError::transport_decode("data URL without a ',' separator"))?,
        None => text,
    };

    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact.as_bytes())?)
}

fn latin1_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_pre_encoded_roundtrip() {
        let encoded = STANDARD.encode(PNG_HEADER);
        let decoded = decode_payload(RawPayload::Text(encoded), TransportHint::PreEncodedBase64).unwrap();
        assert_eq!(decoded.bytes, PNG_HEADER);
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_gateway_base64_from_bytes() {
        let encoded = STANDARD.encode(b"\xFF\xD8\xFFjpeg").into_bytes();
        let decoded = decode_payload(RawPayload::Bytes(encoded), TransportHint::GatewayBase64).unwrap();
        assert_eq!(decoded.bytes, b"\xFF\xD8\xFFjpeg");
    }

    #[test]
    fn test_base64_ignores_whitespace_and_data_url() {
        let encoded = STANDARD.encode(PNG_HEADER);
        let wrapped = format!("data:image/png;base64,{}\n{}\r\n", &encoded[..4], &encoded[4..]);
        assert_eq!(decode_base64(&wrapped).unwrap(), PNG_HEADER);
    }

    #[test]
    fn test_invalid_base64_is_transport_error() {
        let err = decode_payload(RawPayload::Text("@@not-base64@@".to_string()), TransportHint::PreEncodedBase64)
            .unwrap_err();
        assert!(matches!(err, ReceiptlyError::TransportDecode { .. }));
    }

    #[test]
    fn test_raw_binary_bytes_verbatim() {
        let decoded = decode_payload(RawPayload::Bytes(PNG_HEADER.to_vec()), TransportHint::RawBinary).unwrap();
        assert_eq!(decoded.bytes, PNG_HEADER);
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_raw_text_uses_latin1_and_is_flagged() {
        let text: String = PNG_HEADER.iter().map(|b| char::from(*b)).collect();
        let decoded = decode_payload(RawPayload::Text(text), TransportHint::RawBinary).unwrap();
        assert_eq!(decoded.bytes, PNG_HEADER);
        assert!(decoded.lossy);
    }

    #[test]
    fn test_latin1_replaces_unrepresentable_chars() {
        assert_eq!(latin1_bytes("a\u{20AC}b"), b"a?b");
    }

    #[test]
    fn test_empty_payload_decodes_to_empty() {
        let decoded = decode_payload(RawPayload::Text(String::new()), TransportHint::PreEncodedBase64).unwrap();
        assert!(decoded.bytes.is_empty());
    }
}
