//! Dashboard client configuration
//!
//! Loaded from `~/.byod/ui.toml`, then overridden by `BYOD_UI_URL` /
//! `BYOD_API_KEY`. A missing file means defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ApiError, Result};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8420";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_STREAM_IDLE_TIMEOUT_SECS: u64 = 600;

const CONFIG_DIR_NAME: &str = ".byod";
const CONFIG_FILE_NAME: &str = "ui.toml";

pub const ENV_BASE_URL: &str = "BYOD_UI_URL";
pub const ENV_API_KEY: &str = "BYOD_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// Root of the local UI server; `/api/...` routes hang off it
    pub base_url: String,
    /// Sent as a bearer token when set
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    /// How long a streamed command waits for the next update
    pub stream_idle_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            stream_idle_timeout_secs: DEFAULT_STREAM_IDLE_TIMEOUT_SECS,
        }
    }
}

impl DashboardConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from `path` (or the default location) and apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read one file; absent file yields defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ApiError::Config(format!("reading {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| ApiError::Config(format!("parsing {}: {}", path.display(), e)))
    }

    /// Apply overrides from an env lookup (injected for tests)
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    /// Check the base URL parses and warn on plaintext to remote hosts
    pub fn validate(&self) -> Result<()> {
        let url = self.parsed_base_url()?;
        if url.scheme() != "https" && !is_loopback(&url) {
            warn!(
                "Base URL {} uses plain HTTP to a non-local host; credentials may be sent in plaintext",
                self.base_url
            );
        }
        Ok(())
    }

    pub fn parsed_base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| ApiError::Config(format!("invalid base_url '{}': {}", self.base_url, e)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_idle_timeout_secs)
    }
}

fn is_loopback(url: &Url) -> bool {
    matches!(
        url.host_str(),
        Some("localhost") | Some("127.0.0.1") | Some("0.0.0.0") | Some("[::1]")
    )
}
