//! Client configuration for Merit front ends.
//!
//! A small JSON document naming the backend and tuning the store's policy
//! knobs. Every field is optional.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::{normalize_base_url, DEFAULT_TIMEOUT_SECS};
use crate::error::{Error, Result};
use crate::util::normalize_text_option;

/// Backend used when no base URL is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

const DEFAULT_LOGIN_PROMPT_THRESHOLD: usize = 3;
const DEFAULT_FATE_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub policy: StorePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            policy: StorePolicy::default(),
        }
    }
}

/// Tunable behaviour of the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorePolicy {
    /// Today's local record count at which an offline user is nudged to sign in.
    #[serde(default = "default_login_prompt_threshold")]
    pub login_prompt_threshold: usize,
    /// Trailing window, in days including today, of the local fate index.
    #[serde(default = "default_fate_window_days")]
    pub fate_window_days: u32,
}

impl Default for StorePolicy {
    fn default() -> Self {
        Self {
            login_prompt_threshold: DEFAULT_LOGIN_PROMPT_THRESHOLD,
            fate_window_days: DEFAULT_FATE_WINDOW_DAYS,
        }
    }
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_login_prompt_threshold() -> usize {
    DEFAULT_LOGIN_PROMPT_THRESHOLD
}

const fn default_fate_window_days() -> u32 {
    DEFAULT_FATE_WINDOW_DAYS
}

impl ClientConfig {
    /// Parse and validate a config document.
    pub fn parse(payload: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(payload)?;
        config.normalize()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        let payload = std::fs::read_to_string(path)?;
        Self::parse(&payload)
    }

    /// Validate, then write as pretty JSON, creating parent directories.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut checked = self.clone();
        checked.normalize()?;
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&checked)?)?;
        Ok(())
    }

    /// Replace the API base URL (e.g. from the environment).
    pub fn with_api_base_url(mut self, url: Option<String>) -> Result<Self> {
        if let Some(url) = normalize_text_option(url) {
            self.api_base_url = Some(url);
            self.normalize()?;
        }
        Ok(self)
    }

    /// The configured base URL, or [`DEFAULT_API_BASE_URL`].
    pub fn resolved_api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn normalize(&mut self) -> Result<()> {
        self.api_base_url = normalize_text_option(self.api_base_url.take())
            .map(|url| normalize_base_url(&url))
            .transpose()?;
        if self.request_timeout_secs == 0 {
            return Err(Error::InvalidInput(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.policy.fate_window_days == 0 {
            return Err(Error::InvalidInput(
                "policy.fate_window_days must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
