//! Integration tests for the serverless function face.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use receiptly::{
    ExtractionPipeline, FunctionHandler, GatewayRequest, ReceiptlyError, Result, ServiceConfig, VisionClient,
};
use serde_json::Value;

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

struct FixedReply(std::result::Result<&'static str, &'static str>);

#[async_trait]
impl VisionClient for FixedReply {
    async fn invoke(&self, _image: &[u8], _mime_type: &str, _prompt: &str) -> Result<String> {
        match self.0 {
            Ok(text) => Ok(text.to_string()),
            Err(message) => Err(ReceiptlyError::upstream(message)),
        }
    }
}

fn mock_handler() -> FunctionHandler {
    FunctionHandler::new(Arc::new(ExtractionPipeline::mock_only(&ServiceConfig::default())))
}

fn handler_replying(reply: std::result::Result<&'static str, &'static str>) -> FunctionHandler {
    FunctionHandler::new(Arc::new(ExtractionPipeline::with_vision_client(
        &ServiceConfig::default(),
        Arc::new(FixedReply(reply)),
    )))
}

fn event(method: &str, proxy: &str, headers: &[(&str, &str)], body: Option<String>, gateway_b64: bool) -> GatewayRequest {
    GatewayRequest {
        http_method: method.to_string(),
        path: format!("/api/{proxy}"),
        path_parameters: Some(HashMap::from([("proxy".to_string(), proxy.to_string())])),
        headers: Some(
            headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ),
        body,
        is_base64_encoded: gateway_b64,
    }
}

fn body_json(response: &receiptly::GatewayResponse) -> Value {
    response.json_body().expect("response body should be JSON")
}

#[tokio::test]
async fn test_hello_route() {
    let response = mock_handler().handle(event("GET", "hello", &[], None, false)).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
    let body = body_json(&response);
    assert!(body["message"].as_str().unwrap().starts_with("Hello World"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = mock_handler().handle(event("GET", "receipts", &[], None, false)).await;

    assert_eq!(response.status_code, 404);
    assert_eq!(response.body, r#"{"error":"Not Found"}"#);
    assert_eq!(response.headers["Access-Control-Allow-Methods"], "GET,HEAD,OPTIONS,POST,PUT,DELETE");
}

#[tokio::test]
async fn test_options_preflight() {
    let response = mock_handler()
        .handle(event("OPTIONS", "receipt/extract", &[], None, false))
        .await;

    assert_eq!(response.status_code, 204);
    assert!(response.body.is_empty());
    assert_eq!(response.headers["Access-Control-Allow-Headers"], "*");
}

#[tokio::test]
async fn test_pre_encoded_body_serves_mock_record() {
    let request = event(
        "POST",
        "receipt/extract",
        &[("x-file-content-encoding", "base64"), ("content-type", "text/plain")],
        Some(STANDARD.encode(JPEG)),
        false,
    );
    let response = mock_handler().handle(request).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.headers["Content-Type"], "application/json");
    let body = body_json(&response);
    assert_eq!(body["processingStatus"], "Success");
    assert_eq!(body["extractedData"]["business_name"], "Demo Coffee Shop");
    assert!(body.get("errorMessage").is_none());
}

#[tokio::test]
async fn test_gateway_base64_body_reaches_model() {
    let request = event(
        "POST",
        "receipt/extract",
        &[],
        Some(STANDARD.encode(JPEG)),
        true,
    );
    let response = handler_replying(Ok("```json\n{\"total\": \"$8.37\", \"tax\": \"$0.62\"}\n```"))
        .handle(request)
        .await;

    assert_eq!(response.status_code, 200);
    let body = body_json(&response);
    assert_eq!(body["extractedData"]["total"], "$8.37");
    assert_eq!(body["extractedData"]["tax"], "$0.62");
}

#[tokio::test]
async fn test_latin1_fallback_carries_warning() {
    let text: String = JPEG.iter().map(|&b| char::from(b)).collect();
    let response = mock_handler()
        .handle(event("POST", "receipt/extract", &[], Some(text), false))
        .await;

    assert_eq!(response.status_code, 200);
    let body = body_json(&response);
    assert_eq!(body["processingStatus"], "Success");
    assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_body_is_400() {
    let response = mock_handler()
        .handle(event("POST", "receipt/extract", &[("X-File-Content-Encoding", "base64")], None, false))
        .await;

    assert_eq!(response.status_code, 400);
    let body = body_json(&response);
    assert_eq!(body["processingStatus"], "Error");
    assert_eq!(body["errorMessage"], "No file provided");
}

#[tokio::test]
async fn test_invalid_base64_is_400() {
    let response = mock_handler()
        .handle(event(
            "POST",
            "receipt/extract",
            &[("X-File-Content-Encoding", "base64")],
            Some("not*base64".to_string()),
            false,
        ))
        .await;

    assert_eq!(response.status_code, 400);
}

#[tokio::test]
async fn test_upstream_failure_is_generic_500() {
    let response = handler_replying(Err("connection reset by api.openai.com"))
        .handle(event("POST", "receipt/extract", &[], Some(STANDARD.encode(JPEG)), true))
        .await;

    assert_eq!(response.status_code, 500);
    assert!(!response.body.contains("openai.com"));
    let body = body_json(&response);
    assert_eq!(body["errorMessage"], "Failed to process receipt image");
    assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
}

#[tokio::test]
async fn test_route_from_path_without_proxy_parameter() {
    let request = GatewayRequest {
        http_method: "POST".to_string(),
        path: "/api/Receipt/Extract".to_string(),
        body: Some(STANDARD.encode(JPEG)),
        is_base64_encoded: true,
        ..GatewayRequest::default()
    };
    let response = mock_handler().handle(request).await;
    assert_eq!(response.status_code, 200);
}

#[tokio::test]
async fn test_rejection_matches_shared_mapping() {
    // Bare bodies have no filename, so only the size and emptiness checks apply.
    let mut config = ServiceConfig::default();
    config.upload.max_size_bytes = 4;
    let handler = FunctionHandler::new(Arc::new(ExtractionPipeline::mock_only(&config)));

    let response = handler
        .handle(event("POST", "receipt/extract", &[], Some(STANDARD.encode(JPEG)), true))
        .await;

    let expected = receiptly::resolve_outcome(Err(receiptly::UploadRejection::FileTooLarge { limit_bytes: 4 }.into()));
    assert_eq!(response.status_code, expected.0);
    assert_eq!(body_json(&response)["errorMessage"], expected.1.error_message.unwrap());
}
