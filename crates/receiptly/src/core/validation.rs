//! Upload validation.
//!
//! Runs before any external call so invalid input never costs a model request.

use crate::core::config::UploadPolicy;
use crate::error::UploadRejection;
use crate::types::UploadDescriptor;
use std::path::Path;

/// Check `upload` against `policy`. First failure wins:
///
/// 1. Missing or zero-length payload → `EmptyFile`
/// 2. `size_bytes > max_size_bytes` → `FileTooLarge`
/// 3. Extension absent or not allowed (case-insensitive) → `UnsupportedType`
///
/// Uploads without a filename (bare request bodies) skip the extension check;
/// a filename without an extension fails it.
pub fn validate_upload(upload: &UploadDescriptor, policy: &UploadPolicy) -> Result<(), UploadRejection> {
    if upload.size_bytes == 0 || upload.bytes.is_empty() {
        return Err(UploadRejection::EmptyFile);
    }

    if upload.size_bytes > policy.max_size_bytes {
        return Err(UploadRejection::FileTooLarge {
            limit_bytes: policy.max_size_bytes,
        });
    }

    if let Some(filename) = upload.filename.as_deref() {
        let allowed = file_extension(filename).is_some_and(|ext| policy.allows_extension(ext));
        if !allowed {
            return Err(UploadRejection::UnsupportedType {
                allowed: policy.allowed_extensions.clone(),
            });
        }
    }

    Ok(())
}

fn file_extension(filename: &str) -> Option<&str> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
}
