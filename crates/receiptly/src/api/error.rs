//! API error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::core::outcome::resolve_outcome;
use crate::error::{ReceiptlyError, UploadRejection};

/// Error returned by API handlers.
///
/// Renders as an `ExtractionResult` with `processingStatus = "Error"`, using
/// the same status and message mapping as the function face.
#[derive(Debug)]
pub struct ApiError {
    pub error: ReceiptlyError,
}

impl ApiError {
    /// Wrap `error`. The status follows [`ReceiptlyError::http_status`].
    pub fn new(error: ReceiptlyError) -> Self {
        Self { error }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<ReceiptlyError> for ApiError {
    fn from(error: ReceiptlyError) -> Self {
        Self::new(error)
    }
}

impl From<UploadRejection> for ApiError {
    fn from(rejection: UploadRejection) -> Self {
        Self::new(rejection.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (_, body) = resolve_outcome(Err(self.error));
        (status, Json(body)).into_response()
    }
}
