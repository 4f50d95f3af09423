//! Mapping of pipeline outcomes to response status and body.
//!
//! Both deployment faces go through [`resolve_outcome`] so a given input gets
//! the same status code and result JSON on either face.

use crate::types::ExtractionResult;
use crate::{ReceiptlyError, Result};

/// Status code and result body for a finished run.
///
/// Client errors are logged at `warn`, everything else at `error` with the
/// full source chain. The returned result only carries the caller-safe message.
pub fn resolve_outcome(outcome: Result<ExtractionResult>) -> (u16, ExtractionResult) {
    match outcome {
        Ok(result) => (200, result),
        Err(err) => {
            log_failure(&err);
            (err.http_status(), ExtractionResult::from_error(&err))
        }
    }
}

fn log_failure(err: &ReceiptlyError) {
    if err.is_client_error() {
        tracing::warn!("Extraction rejected: {}", err);
        return;
    }

    let mut detail = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    tracing::error!("Extraction failed: {}", detail);
}
