//! Gateway proxy event and response envelopes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Proxy-integration request as delivered by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    #[serde(default)]
    pub http_method: String,

    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,

    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,

    #[serde(default)]
    pub body: Option<String>,

    /// Set by the gateway when it base64-encoded a binary body.
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl GatewayRequest {
    /// Header value, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Route key: the `proxy` path parameter, else the path with any leading
    /// `/` and `api/` prefix removed.
    pub fn route(&self) -> &str {
        if let Some(proxy) = self.path_parameters.as_ref().and_then(|params| params.get("proxy")) {
            return proxy.trim_start_matches('/');
        }

        let path = self.path.trim_start_matches('/');
        match path.get(..4) {
            Some(prefix) if prefix.eq_ignore_ascii_case("api/") => &path[4..],
            _ => path,
        }
    }
}

/// Proxy-integration response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl GatewayResponse {
    /// Body parsed as JSON. Mostly useful in tests and the CLI.
    pub fn json_body(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}
