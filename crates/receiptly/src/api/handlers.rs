//! API request handlers.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use http_body_util::LengthLimitError;

use crate::error::{ReceiptlyError, UploadRejection};
use crate::types::ExtractionInput;

use super::{
    error::ApiError,
    types::{ApiState, ExtractResponse, HealthResponse, InfoResponse},
};

/// Multipart field carrying the receipt image.
pub const FILE_FIELD: &str = "file";

/// Extract endpoint handler.
///
/// POST /api/receipt/extract
///
/// Accepts multipart form data with a single `file` field. Other fields are
/// ignored. Returns `200` with the extraction result, `400` for unusable
/// uploads and `500` (generic message) when the model call fails.
///
/// If the client disconnects, the handler future is dropped together with
/// the in-flight model request.
pub async fn extract_handler(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&state, e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // Multipart uploads always go through the extension check, even when
        // the client omitted the filename.
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field.bytes().await.map_err(|e| multipart_error(&state, e))?;

        tracing::info!("Received upload '{}' ({} bytes)", file_name, data.len());
        upload = Some(ExtractionInput::upload(data.to_vec(), file_name, content_type));
    }

    let input = upload.ok_or_else(|| ApiError::from(UploadRejection::EmptyFile))?;
    let result = state.pipeline.run(input).await?;
    Ok(Json(result))
}

fn multipart_error(state: &ApiState, error: MultipartError) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE || exceeds_body_limit(&error) {
        return file_too_large(state);
    }
    ReceiptlyError::validation(format!("Invalid multipart request: {}", error.body_text())).into()
}

/// Whether a stream failure was caused by a body length cap.
///
/// The limit error can sit several `axum::Error` wrappers deep, so the whole
/// source chain is searched.
fn exceeds_body_limit(error: &MultipartError) -> bool {
    std::iter::successors(Some(error as &(dyn std::error::Error + 'static)), |err| err.source())
        .any(|err| err.is::<LengthLimitError>())
}

pub(crate) fn file_too_large(state: &ApiState) -> ApiError {
    UploadRejection::FileTooLarge {
        limit_bytes: state.pipeline.policy().max_size_bytes,
    }
    .into()
}

/// Health check endpoint handler.
///
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Server info endpoint handler.
///
/// GET /info
pub async fn info_handler(State(state): State<ApiState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.pipeline.model().to_string(),
        mock_mode: state.pipeline.is_mock_mode().await,
    })
}
