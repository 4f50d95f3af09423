//! Configuration loading and management.
//!
//! Configuration is read from `receiptly.toml` (discovered in the current or a
//! parent directory), a TOML/JSON file given explicitly, or defaults. Environment
//! variables are applied last via [`ServiceConfig::apply_env_overrides`].
//!
//! # Example
//!
//! ```toml
//! [upload]
//! max_size_bytes = 5242880
//! allowed_extensions = [".png", ".jpg"]
//!
//! [vision]
//! model = "gpt-4.1-mini"
//! timeout_secs = 45
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! ```

use crate::{ReceiptlyError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file searched for by [`ServiceConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "receiptly.toml";

/// Top-level service configuration shared by both deployment faces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub upload: UploadPolicy,

    #[serde(default)]
    pub vision: VisionConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Upload limits enforced before any external call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    /// Maximum accepted file size in bytes
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,

    /// Allowed file extensions, with leading dot (matched case-insensitively)
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

/// Vision model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// API key used directly by the HTTP face (None = mock mode unless a secret is configured)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Name of the environment variable holding the secret identifier
    #[serde(default = "default_api_key_secret_env")]
    pub api_key_secret_env: String,

    /// Chat model with vision support
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the chat-completions API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout for one model call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional cap on generated tokens
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Hard cap on the whole request body, enforced by the transport layer
    #[serde(default = "default_max_request_body_bytes")]
    pub max_request_body_bytes: usize,

    /// Explicit CORS origins (empty = allow any)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_max_size_bytes() -> u64 {
    10_485_760
}
fn default_allowed_extensions() -> Vec<String> {
    vec![".png".to_string(), ".jpg".to_string(), ".jpeg".to_string()]
}
fn default_api_key_secret_env() -> String {
    "OPENAI_API_KEY_SECRET".to_string()
}
fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_max_request_body_bytes() -> usize {
    // 10 MiB of file plus room for the multipart envelope.
    10 * 1024 * 1024 + 64 * 1024
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_size_bytes(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_secret_env: default_api_key_secret_env(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_tokens: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_request_body_bytes: default_max_request_body_bytes(),
            cors_origins: Vec::new(),
        }
    }
}

impl UploadPolicy {
    /// Whether `extension` (with or without leading dot) is on the allow-list.
    pub fn allows_extension(&self, extension: &str) -> bool {
        let wanted = extension.trim_start_matches('.');
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(wanted))
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptlyError::Validation` if the file can't be read or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ReceiptlyError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ReceiptlyError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))?;
        Ok(config.checked())
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ReceiptlyError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ReceiptlyError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))?;
        Ok(config.checked())
    }

    /// Load from a file, choosing the format by extension (`.json`, otherwise TOML).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let is_json = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_file(path)
        } else {
            Self::from_toml_file(path)
        }
    }

    /// Discover `receiptly.toml` in the current directory or any parent.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(ReceiptlyError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Explicit file if given, else discovery, else defaults; then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::discover()? {
                Some(config) => {
                    tracing::info!("Loaded configuration from discovered {}", CONFIG_FILE_NAME);
                    config
                }
                None => {
                    tracing::info!("No config file found, using default configuration");
                    Self::default()
                }
            },
        };

        Ok(config.apply_env_overrides())
    }

    /// Apply `RECEIPTLY_*` environment variables on top of this configuration.
    ///
    /// Unparseable values are logged and ignored.
    ///
    /// ```bash
    /// export RECEIPTLY_OPENAI_API_KEY=sk-...
    /// export RECEIPTLY_VISION_MODEL=gpt-4.1-mini
    /// export RECEIPTLY_VISION_BASE_URL=https://api.openai.com/v1
    /// export RECEIPTLY_VISION_TIMEOUT_SECS=45
    /// export RECEIPTLY_MAX_UPLOAD_BYTES=10485760
    /// export RECEIPTLY_ALLOWED_EXTENSIONS=.png,.jpg,.jpeg,.webp
    /// export RECEIPTLY_MAX_REQUEST_BODY_BYTES=11000000
    /// export RECEIPTLY_HOST=0.0.0.0
    /// export RECEIPTLY_PORT=8080
    /// export RECEIPTLY_CORS_ORIGINS="https://app.example.com"
    /// ```
    pub fn apply_env_overrides(mut self) -> Self {
        if let Some(key) = env_string("RECEIPTLY_OPENAI_API_KEY") {
            self.vision.api_key = Some(key);
        }
        if let Some(model) = env_string("RECEIPTLY_VISION_MODEL") {
            self.vision.model = model;
        }
        if let Some(base_url) = env_string("RECEIPTLY_VISION_BASE_URL") {
            self.vision.base_url = base_url;
        }
        if let Some(secs) = env_parsed::<u64>("RECEIPTLY_VISION_TIMEOUT_SECS").filter(|secs| *secs > 0) {
            self.vision.timeout_secs = secs;
        }
        if let Some(bytes) = env_parsed::<u64>("RECEIPTLY_MAX_UPLOAD_BYTES").filter(|bytes| *bytes > 0) {
            self.upload.max_size_bytes = bytes;
        }
        if let Some(list) = env_string("RECEIPTLY_ALLOWED_EXTENSIONS") {
            let extensions = split_list(&list)
                .map(|ext| {
                    if ext.starts_with('.') {
                        ext.to_lowercase()
                    } else {
                        format!(".{}", ext.to_lowercase())
                    }
                })
                .collect::<Vec<_>>();
            if extensions.is_empty() {
                tracing::warn!("RECEIPTLY_ALLOWED_EXTENSIONS set but empty, keeping configured extensions");
            } else {
                self.upload.allowed_extensions = extensions;
            }
        }
        if let Some(bytes) = env_parsed::<usize>("RECEIPTLY_MAX_REQUEST_BODY_BYTES").filter(|bytes| *bytes > 0) {
            self.server.max_request_body_bytes = bytes;
        }
        if let Some(host) = env_string("RECEIPTLY_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parsed::<u16>("RECEIPTLY_PORT") {
            self.server.port = port;
        }
        if let Some(origins) = env_string("RECEIPTLY_CORS_ORIGINS") {
            self.server.cors_origins = split_list(&origins).map(str::to_string).collect();
        }
        self.checked()
    }

    /// Whether a file of `upload.max_size_bytes` can get past the transport cap.
    ///
    /// When it can't, oversized uploads are stopped by the cap before the
    /// policy check and the configured limit is never the one reported.
    pub fn upload_limit_fits_transport_cap(&self) -> bool {
        self.upload.max_size_bytes <= self.server.max_request_body_bytes as u64
    }

    /// Replace values that would break every request and warn about
    /// combinations that hide a limit.
    fn checked(mut self) -> Self {
        if self.vision.timeout_secs == 0 {
            tracing::warn!(
                "vision.timeout_secs = 0 would fail every model call, using {}s",
                default_timeout_secs()
            );
            self.vision.timeout_secs = default_timeout_secs();
        }
        if !self.upload_limit_fits_transport_cap() {
            tracing::warn!(
                "upload.max_size_bytes ({}) exceeds server.max_request_body_bytes ({}); \
                 larger uploads are cut off by the transport cap",
                self.upload.max_size_bytes,
                self.server.max_request_body_bytes
            );
        }
        self
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    let value = env_string(name)?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Failed to parse {}='{}', ignoring", name, value);
            None
        }
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|item| !item.is_empty())
}
