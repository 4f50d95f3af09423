//! Vision credential resolution.
//!
//! The HTTP face takes its key straight from configuration. The function face
//! only knows the *name* of a secret (from an environment variable) and asks a
//! [`SecretSource`] for the value. Either way the result is `Some(key)` or
//! "not configured", which switches the pipeline to mock data.

use crate::{ReceiptlyError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Value shipped in sample configuration files. Treated as "not configured".
pub const PLACEHOLDER_API_KEY: &str = "your-openai-api-key-here";

/// Whether `key` is empty, whitespace or the sample placeholder.
pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim();
    key.is_empty() || key == PLACEHOLDER_API_KEY
}

/// External secret store, keyed by secret identifier.
#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn fetch_secret(&self, secret_id: &str) -> Result<String>;
}

/// Reads each secret from the environment variable named by its identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretSource;

#[async_trait]
impl SecretSource for EnvSecretSource {
    async fn fetch_secret(&self, secret_id: &str) -> Result<String> {
        std::env::var(secret_id)
            .map_err(|e| ReceiptlyError::upstream_with_source(format!("Secret '{secret_id}' is not available"), e))
    }
}

/// Fixed in-memory secrets.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretSource {
    secrets: HashMap<String, String>,
}

impl StaticSecretSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, secret_id: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(secret_id.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretSource for StaticSecretSource {
    async fn fetch_secret(&self, secret_id: &str) -> Result<String> {
        self.secrets
            .get(secret_id)
            .cloned()
            .ok_or_else(|| ReceiptlyError::upstream(format!("Secret '{secret_id}' not found")))
    }
}

/// Where the vision API key comes from.
#[derive(Clone)]
pub enum CredentialSource {
    /// Key known up front (configuration). `None` means mock mode.
    Static(Option<String>),
    /// Secret identifier read from `secret_id_env`, value fetched from `source`.
    SecretStore {
        secret_id_env: String,
        source: Arc<dyn SecretSource>,
    },
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Static(key) => f
                .debug_tuple("Static")
                .field(&key.as_ref().map(|_| "<redacted>"))
                .finish(),
            CredentialSource::SecretStore { secret_id_env, .. } => f
                .debug_struct("SecretStore")
                .field("secret_id_env", secret_id_env)
                .finish_non_exhaustive(),
        }
    }
}

impl CredentialSource {
    /// Secret store lookup driven by the environment.
    pub fn from_env(secret_id_env: impl Into<String>) -> Self {
        CredentialSource::SecretStore {
            secret_id_env: secret_id_env.into(),
            source: Arc::new(EnvSecretSource),
        }
    }

    /// Resolve the API key.
    ///
    /// Returns `Ok(None)` when no usable credential is configured: no key, a
    /// placeholder key, or a missing secret identifier. The last case is a
    /// deployment mistake and is logged as a configuration error, but the
    /// pipeline still serves mock data instead of failing.
    ///
    /// # Errors
    ///
    /// A failing secret fetch is returned as `ReceiptlyError::Upstream`.
    pub async fn resolve(&self) -> Result<Option<String>> {
        let key = match self {
            CredentialSource::Static(key) => key.clone(),
            CredentialSource::SecretStore { secret_id_env, source } => {
                let secret_id = match std::env::var(secret_id_env) {
                    Ok(id) if !id.trim().is_empty() => id,
                    _ => {
                        let err =
                            ReceiptlyError::configuration(format!("{secret_id_env} environment variable not set"));
                        tracing::error!("{}", err);
                        return Ok(None);
                    }
                };

                let value = source.fetch_secret(secret_id.trim()).await.map_err(|e| match e {
                    upstream @ ReceiptlyError::Upstream { .. } => upstream,
                    other => ReceiptlyError::upstream_with_source("Failed to fetch vision API key", other),
                })?;
                Some(value)
            }
        };

        match key {
            Some(key) if !is_placeholder_key(&key) => Ok(Some(key.trim().to_string())),
            Some(_) => {
                tracing::warn!("Vision API key is a placeholder, treating as not configured");
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
