//! Image format detection from magic bytes.
//!
//! Detection never fails: unknown signatures fall back to JPEG so the model
//! call can still go ahead with a best-guess MIME type.

use serde::{Deserialize, Serialize};

pub const PNG_MIME_TYPE: &str = "image/png";
pub const JPEG_MIME_TYPE: &str = "image/jpeg";
pub const GIF_MIME_TYPE: &str = "image/gif";
pub const WEBP_MIME_TYPE: &str = "image/webp";

const PNG_SIGNATURE: &[u8] = &[0x89, 0x50, 0x4E, 0x47];
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];
const GIF_SIGNATURE: &[u8] = &[0x47, 0x49, 0x46];
const RIFF_SIGNATURE: &[u8] = &[0x52, 0x49, 0x46, 0x46];
const WEBP_SIGNATURE: &[u8] = &[0x57, 0x45, 0x42, 0x50];

/// Image format recognized from the leading bytes of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
    /// No signature matched; treated as JPEG.
    UnknownDefaultJpeg,
}

impl DetectedFormat {
    /// Canonical MIME type sent to the vision model.
    pub fn mime_type(self) -> &'static str {
        match self {
            DetectedFormat::Png => PNG_MIME_TYPE,
            DetectedFormat::Jpeg | DetectedFormat::UnknownDefaultJpeg => JPEG_MIME_TYPE,
            DetectedFormat::Gif => GIF_MIME_TYPE,
            DetectedFormat::WebP => WEBP_MIME_TYPE,
        }
    }

    pub fn is_recognized(self) -> bool {
        self != DetectedFormat::UnknownDefaultJpeg
    }
}

impl std::fmt::Display for DetectedFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DetectedFormat::Png => "PNG",
            DetectedFormat::Jpeg => "JPEG",
            DetectedFormat::Gif => "GIF",
            DetectedFormat::WebP => "WebP",
            DetectedFormat::UnknownDefaultJpeg => "unknown (defaulting to JPEG)",
        };
        f.write_str(name)
    }
}

/// Classify `bytes` by signature. Total and pure for any input length.
///
/// Signatures are checked in order: PNG, JPEG, GIF, then WebP (`RIFF` at 0..4
/// and `WEBP` at 8..12).
pub fn sniff_image_format(bytes: &[u8]) -> DetectedFormat {
    if bytes.starts_with(PNG_SIGNATURE) {
        DetectedFormat::Png
    } else if bytes.starts_with(JPEG_SIGNATURE) {
        DetectedFormat::Jpeg
    } else if bytes.starts_with(GIF_SIGNATURE) {
        DetectedFormat::Gif
    } else if bytes.starts_with(RIFF_SIGNATURE) && bytes.get(8..12) == Some(WEBP_SIGNATURE) {
        DetectedFormat::WebP
    } else {
        DetectedFormat::UnknownDefaultJpeg
    }
}

/// Hex rendering of the first `n` bytes, for debug logging.
pub(crate) fn leading_hex(bytes: &[u8], n: usize) -> String {
    hex::encode_upper(&bytes[..bytes.len().min(n)])
}
