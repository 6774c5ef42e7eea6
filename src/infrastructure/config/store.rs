//! Remote quest catalog and progress store settings.

use serde::{Deserialize, Serialize};

/// Environment variable holding the store bearer token.
pub const API_TOKEN_ENV: &str = "QUESTBOARD_API_TOKEN";

/// Connection settings for the remote service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Base URL of the tracker service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout (milliseconds).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Bearer token, loaded from [`API_TOKEN_ENV`] and never from the file.
    #[serde(skip)]
    pub api_token: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8080".into()
}

const fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            api_token: None,
        }
    }
}
