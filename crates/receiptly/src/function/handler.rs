//! Serverless function face.
//!
//! Translates gateway proxy events into pipeline inputs and pipeline outcomes
//! back into gateway responses. Every response carries permissive CORS headers.

use super::event::{GatewayRequest, GatewayResponse};
use crate::core::config::ServiceConfig;
use crate::core::outcome::resolve_outcome;
use crate::core::pipeline::ExtractionPipeline;
use crate::credentials::CredentialSource;
use crate::types::{ExtractionInput, RawPayload, TransportHint};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Header a client sets when it base64-encoded the file itself.
pub const FILE_ENCODING_HEADER: &str = "X-File-Content-Encoding";

const ALLOW_METHODS: &str = "GET,HEAD,OPTIONS,POST,PUT,DELETE";
const HELLO_ROUTE: &str = "hello";
const EXTRACT_ROUTE: &str = "receipt/extract";

/// Dispatches gateway events to the hello and extraction routes.
#[derive(Debug, Clone)]
pub struct FunctionHandler {
    pipeline: Arc<ExtractionPipeline>,
}

impl FunctionHandler {
    pub fn new(pipeline: Arc<ExtractionPipeline>) -> Self {
        Self { pipeline }
    }

    /// Handler whose API key is fetched from the secret named by
    /// `config.vision.api_key_secret_env`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let credentials = CredentialSource::from_env(config.vision.api_key_secret_env.clone());
        Self::new(Arc::new(ExtractionPipeline::with_credentials(config, credentials)))
    }

    pub fn pipeline(&self) -> &ExtractionPipeline {
        &self.pipeline
    }

    /// Handle one gateway event. Never fails; errors become JSON responses.
    pub async fn handle(&self, request: GatewayRequest) -> GatewayResponse {
        tracing::info!("Request: {} {}", request.http_method, request.path);

        if request.http_method.eq_ignore_ascii_case("OPTIONS") {
            return GatewayResponse {
                status_code: 204,
                headers: cors_headers(),
                body: String::new(),
                is_base64_encoded: false,
            };
        }

        let route = request.route().to_string();
        if starts_with_ignore_case(&route, HELLO_ROUTE) {
            json_response(
                200,
                &json!({
                    "message": "Hello World from the receipt function!",
                    "timestamp": Utc::now(),
                }),
            )
        } else if starts_with_ignore_case(&route, EXTRACT_ROUTE) {
            self.handle_extract(request).await
        } else {
            tracing::debug!("No route for '{}'", route);
            json_response(404, &json!({ "error": "Not Found" }))
        }
    }

    async fn handle_extract(&self, request: GatewayRequest) -> GatewayResponse {
        let hint = transport_hint(&request);
        tracing::info!(
            "Content-Type: {}, {}: {}, isBase64Encoded: {}",
            request.header("Content-Type").unwrap_or("unknown"),
            FILE_ENCODING_HEADER,
            request.header(FILE_ENCODING_HEADER).unwrap_or("binary"),
            request.is_base64_encoded
        );

        let declared_content_type = request.header("Content-Type").map(str::to_string);
        let mut input = ExtractionInput::body(RawPayload::Text(request.body.unwrap_or_default()), hint);
        input.declared_content_type = declared_content_type;

        let (status, result) = resolve_outcome(self.pipeline.run(input).await);
        json_response(status, &result)
    }
}

/// Pre-encoded header wins over the gateway flag; anything else is raw text.
pub fn transport_hint(request: &GatewayRequest) -> TransportHint {
    let pre_encoded = request
        .header(FILE_ENCODING_HEADER)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("base64"));

    if pre_encoded {
        TransportHint::PreEncodedBase64
    } else if request.is_base64_encoded {
        TransportHint::GatewayBase64
    } else {
        TransportHint::RawBinary
    }
}

fn starts_with_ignore_case(route: &str, prefix: &str) -> bool {
    route
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn cors_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        ("Access-Control-Allow-Methods".to_string(), ALLOW_METHODS.to_string()),
        ("Access-Control-Allow-Headers".to_string(), "*".to_string()),
        ("Content-Type".to_string(), "application/json".to_string()),
    ])
}

fn json_response<T: Serialize>(status_code: u16, body: &T) -> GatewayResponse {
    match serde_json::to_string(body) {
        Ok(body) => GatewayResponse {
            status_code,
            headers: cors_headers(),
            body,
            is_base64_encoded: false,
        },
        Err(e) => {
            tracing::error!("Failed to serialize response body: {}", e);
            GatewayResponse {
                status_code: 500,
                headers: cors_headers(),
                body: r#"{"error":"Internal server error"}"#.to_string(),
                is_base64_encoded: false,
            }
        }
    }
}
