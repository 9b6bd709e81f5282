// Configuration structs

use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::constants::{
    DEFAULT_BACKEND_URL, DEFAULT_CREDENTIAL_ENV, DEFAULT_GATEWAY_ADDR, DEFAULT_MAX_UPLOAD_BYTES,
};

/// Gateway server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3000")
    pub bind_address: String,
    /// Largest request body accepted on the upload route
    pub max_upload_bytes: usize,
    /// Allow cross-origin calls from any origin (the SPA is normally same-origin)
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_GATEWAY_ADDR.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_permissive: false,
        }
    }
}

/// Where the external analysis service lives and how to reach it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL, without a trailing slash (e.g., "http://localhost:8000")
    pub base_url: String,
    /// Optional per-request timeout. `None` leaves it to the transport.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout_secs: None,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Join a service path ("/upload") onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    /// Name of the environment variable holding the analysis credential
    pub credential_env: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            backend: BackendConfig::default(),
            credential_env: DEFAULT_CREDENTIAL_ENV.to_string(),
        }
    }
}

impl Config {
    /// Validate configuration and return helpful errors
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.server.bind_address.contains(':') {
            bail!(
                "Invalid bind address: '{}'\n\
                 Bind address should be in format 'IP:PORT' (e.g. 127.0.0.1:3000)",
                self.server.bind_address
            );
        }

        let url = self.backend.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!(
                "Invalid backend URL: '{}'\n\
                 The analysis service URL must start with http:// or https://",
                self.backend.base_url
            );
        }

        if self.server.max_upload_bytes == 0 {
            bail!("max_upload_bytes must be greater than 0");
        }

        if self.backend.request_timeout_secs == Some(0) {
            bail!("request_timeout_secs must be greater than 0 when set");
        }

        if self.credential_env.trim().is_empty() {
            bail!("credential_env must name an environment variable");
        }

        Ok(())
    }

    /// Whether the analysis credential is present in the environment.
    ///
    /// Only presence is checked; the value never leaves this function.
    pub fn credential_loaded(&self) -> bool {
        std::env::var(&self.credential_env)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }
}
