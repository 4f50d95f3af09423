//! Vision model client.
//!
//! [`VisionClient`] is the seam between the pipeline and the external model.
//! [`OpenAiVisionClient`] speaks the chat-completions API; tests plug in their
//! own implementations.

use crate::core::config::VisionConfig;
use crate::{ReceiptlyError, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sends one image plus an instruction to a vision model and returns its reply.
///
/// Implementations must not retry; every failure is reported as
/// [`ReceiptlyError::Upstream`] and the caller decides what to do next.
#[async_trait]
pub trait VisionClient: Send + Sync {
    async fn invoke(&self, image: &[u8], mime_type: &str, prompt: &str) -> Result<String>;

    /// Model identifier, for logging.
    fn model(&self) -> &str {
        "unknown"
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client with image input.
pub struct OpenAiVisionClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    max_tokens: Option<u32>,
}

impl std::fmt::Debug for OpenAiVisionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiVisionClient")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl OpenAiVisionClient {
    /// Build a client for `api_key` using the model, endpoint and timeout in `config`.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptlyError::Configuration` if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, config: &VisionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ReceiptlyError::configuration_with_source("Failed to build HTTP client", e))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl VisionClient for OpenAiVisionClient {
    async fn invoke(&self, image: &[u8], mime_type: &str, prompt: &str) -> Result<String> {
        let data_url = format!("data:{};base64,{}", mime_type, STANDARD.encode(image));
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
            max_tokens: self.max_tokens,
        };

        tracing::info!("Calling vision model {} ({} image bytes)", self.model, image.len());

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let what = if e.is_timeout() { "timed out" } else { "failed" };
                ReceiptlyError::upstream_with_source(format!("Vision request {what}"), e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReceiptlyError::upstream(format!(
                "Vision API returned {status}: {body}"
            )));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| ReceiptlyError::upstream_with_source("Vision API returned an unreadable body", e))?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ReceiptlyError::upstream("No response from vision model"))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
