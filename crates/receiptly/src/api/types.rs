//! API request and response types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::config::ServerConfig;
use crate::core::pipeline::ExtractionPipeline;
use crate::types::ExtractionResult;

/// Request size caps applied at the router layer.
///
/// These are transport guards only. The friendly "file too large" message
/// comes from the upload policy, so the defaults leave room above it.
#[derive(Debug, Clone, Copy)]
pub struct ApiSizeLimits {
    /// Maximum size of the entire request body in bytes.
    pub max_request_body_bytes: usize,

    /// Maximum size of a single multipart field in bytes.
    pub max_multipart_field_bytes: usize,
}

impl Default for ApiSizeLimits {
    fn default() -> Self {
        Self::from_server(&ServerConfig::default())
    }
}

impl ApiSizeLimits {
    pub fn new(max_request_body_bytes: usize, max_multipart_field_bytes: usize) -> Self {
        Self {
            max_request_body_bytes,
            max_multipart_field_bytes,
        }
    }

    /// Same cap for the body and each field.
    pub fn from_server(server: &ServerConfig) -> Self {
        Self::new(server.max_request_body_bytes, server.max_request_body_bytes)
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status
    pub status: String,
    /// API version
    pub version: String,
}

/// Server information response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub version: String,
    /// Vision model requests are sent to
    pub model: String,
    /// Whether extraction returns mock data
    pub mock_mode: bool,
}

/// Extraction response.
pub type ExtractResponse = ExtractionResult;

/// API server state.
#[derive(Debug, Clone)]
pub struct ApiState {
    pub pipeline: Arc<ExtractionPipeline>,
}

impl ApiState {
    pub fn new(pipeline: Arc<ExtractionPipeline>) -> Self {
        Self { pipeline }
    }
}
