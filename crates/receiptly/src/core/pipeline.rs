//! Extraction orchestrator.
//!
//! One [`ExtractionPipeline`] is built per process and shared by every request.
//! Each call to [`ExtractionPipeline::run`] walks the stages once:
//!
//! ```text
//! Validating -> Decoding -> Sniffing -> CredentialCheck -+-> (mock) ----------------> Done
//!                                                        +-> Invoking -> Parsing -> Done
//! ```
//!
//! Any stage may end the run early with an error. Nothing is retried.
//!
//! The only shared state is the lazily built vision client, initialized at
//! most once behind a [`tokio::sync::OnceCell`]. A failed credential fetch is
//! not cached, so the next request tries again.

use crate::core::config::{ServiceConfig, UploadPolicy, VisionConfig};
use crate::core::format::{leading_hex, sniff_image_format};
use crate::core::outcome::resolve_outcome;
use crate::core::transport::{LATIN1_FALLBACK_WARNING, decode_payload};
use crate::core::validation::validate_upload;
use crate::credentials::CredentialSource;
use crate::error::UploadRejection;
use crate::types::{ExtractionInput, ExtractionResult, UploadDescriptor};
use crate::vision::parser::PARSE_DEGRADED_WARNING;
use crate::vision::{OpenAiVisionClient, VisionClient, extraction_prompt, mock_result, parse_model_response};
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Number of leading bytes logged for diagnostics.
const LOGGED_PREFIX_BYTES: usize = 20;

/// Pipeline stage, used for transition logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Decoding,
    Sniffing,
    CredentialCheck,
    MockPath,
    Invoking,
    Parsing,
    Done,
}

/// Transport-agnostic extraction pipeline shared by both deployment faces.
pub struct ExtractionPipeline {
    policy: UploadPolicy,
    vision: VisionConfig,
    credentials: CredentialSource,
    client: OnceCell<Option<Arc<dyn VisionClient>>>,
}

impl std::fmt::Debug for ExtractionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionPipeline")
            .field("policy", &self.policy)
            .field("model", &self.vision.model)
            .field("credentials", &self.credentials)
            .field("client_ready", &self.client.initialized())
            .finish()
    }
}

impl ExtractionPipeline {
    /// Pipeline using the API key from `config.vision.api_key`.
    pub fn new(config: &ServiceConfig) -> Self {
        Self::with_credentials(config, CredentialSource::Static(config.vision.api_key.clone()))
    }

    /// Pipeline resolving its key from `credentials` on first use.
    pub fn with_credentials(config: &ServiceConfig, credentials: CredentialSource) -> Self {
        Self {
            policy: config.upload.clone(),
            vision: config.vision.clone(),
            credentials,
            client: OnceCell::new(),
        }
    }

    /// Pipeline bound to an existing client.
    pub fn with_vision_client(config: &ServiceConfig, client: Arc<dyn VisionClient>) -> Self {
        Self {
            policy: config.upload.clone(),
            vision: config.vision.clone(),
            credentials: CredentialSource::Static(None),
            client: OnceCell::new_with(Some(Some(client))),
        }
    }

    /// Pipeline that always serves mock data.
    pub fn mock_only(config: &ServiceConfig) -> Self {
        Self {
            policy: config.upload.clone(),
            vision: config.vision.clone(),
            credentials: CredentialSource::Static(None),
            client: OnceCell::new_with(Some(None)),
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn model(&self) -> &str {
        &self.vision.model
    }

    /// Whether requests are answered with mock data.
    ///
    /// Resolves the credential if that has not happened yet. A failing secret
    /// fetch counts as configured.
    pub async fn is_mock_mode(&self) -> bool {
        matches!(self.vision_client().await, Ok(None))
    }

    /// Run one extraction, returning the result or the error that ended it.
    pub async fn run(&self, input: ExtractionInput) -> Result<ExtractionResult> {
        let ExtractionInput {
            payload,
            hint,
            filename,
            declared_content_type,
        } = input;

        enter(Stage::Validating);
        if payload.is_empty() {
            return Err(UploadRejection::EmptyFile.into());
        }

        enter(Stage::Decoding);
        tracing::debug!("Decoding {} byte payload with {:?}", payload.len(), hint);
        let decoded = decode_payload(payload, hint)?;
        let mut warnings = Vec::new();
        if decoded.lossy {
            warnings.push(LATIN1_FALLBACK_WARNING.to_string());
        }

        let upload = UploadDescriptor::new(decoded.bytes, filename, declared_content_type);
        tracing::debug!(
            "Image bytes length: {}, first {} bytes: {}",
            upload.size_bytes,
            LOGGED_PREFIX_BYTES,
            leading_hex(&upload.bytes, LOGGED_PREFIX_BYTES)
        );
        validate_upload(&upload, &self.policy)?;

        enter(Stage::Sniffing);
        let format = sniff_image_format(&upload.bytes);
        tracing::debug!("Detected format: {} ({})", format, format.mime_type());
        if let Some(declared) = upload.declared_content_type.as_deref()
            && format.is_recognized()
            && !declared.eq_ignore_ascii_case(format.mime_type())
        {
            tracing::debug!("Declared content type {} differs from detected {}", declared, format.mime_type());
        }

        enter(Stage::CredentialCheck);
        let Some(client) = self.vision_client().await? else {
            enter(Stage::MockPath);
            tracing::warn!("Vision API key not configured, returning mock data");
            enter(Stage::Done);
            return Ok(mock_result().with_warnings(warnings));
        };

        enter(Stage::Invoking);
        let reply = client.invoke(&upload.bytes, format.mime_type(), extraction_prompt()).await?;

        enter(Stage::Parsing);
        let parsed = parse_model_response(&reply);
        if parsed.degraded {
            warnings.push(PARSE_DEGRADED_WARNING.to_string());
        }

        enter(Stage::Done);
        tracing::info!("Extracted {} fields using {}", parsed.data.len(), client.model());
        Ok(ExtractionResult::success(parsed.data).with_warnings(warnings))
    }

    /// Run one extraction and fold any error into a failed result.
    pub async fn extract(&self, input: ExtractionInput) -> ExtractionResult {
        resolve_outcome(self.run(input).await).1
    }

    async fn vision_client(&self) -> Result<Option<Arc<dyn VisionClient>>> {
        let client = self.client.get_or_try_init(|| self.build_client()).await?;
        Ok(client.clone())
    }

    async fn build_client(&self) -> Result<Option<Arc<dyn VisionClient>>> {
        let Some(key) = self.credentials.resolve().await? else {
            return Ok(None);
        };
        let client: Arc<dyn VisionClient> = Arc::new(OpenAiVisionClient::new(key, &self.vision)?);
        tracing::info!("Vision client initialized for model {}", self.vision.model);
        Ok(Some(client))
    }
}

/// Run `pipeline` once on a local image file.
///
/// The file name takes part in the extension check like a multipart upload.
pub async fn extract_file(pipeline: &ExtractionPipeline, path: impl AsRef<Path>) -> Result<ExtractionResult> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    pipeline.run(ExtractionInput::upload(bytes, filename, None)).await
}

fn enter(stage: Stage) {
    tracing::debug!(?stage, "Pipeline stage");
}
