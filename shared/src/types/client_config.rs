use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Backend origin, e.g. `"https://pollingservice.example.net"`.
    ///
    /// The `CHUNAAV_API_URL` environment variable takes priority.
    pub base_url: String,
    /// Applies to the whole exchange: connect, send and body read.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Number of records requested by the voter presearch.
    #[serde(default = "default_presearch_page_size")]
    pub presearch_page_size: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// Directory for persisted session and preference state. Without it the
    /// client keeps that state in memory only.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ApiConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            timeout_secs: default_timeout_secs(),
            presearch_page_size: default_presearch_page_size(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the backend origin with `CHUNAAV_API_URL` taking priority over
    /// the config file field. Trailing slashes are stripped.
    pub fn resolved_base_url(&self) -> String {
        std::env::var("CHUNAAV_API_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.base_url.clone())
            .trim()
            .trim_end_matches('/')
            .to_string()
    }
}

impl ClientConfig {
    pub fn new(api: ApiConfig) -> Self {
        Self {
            api,
            storage: StorageConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

pub fn default_timeout_secs() -> u64 {
    30
}

pub fn default_presearch_page_size() -> u32 {
    100
}
