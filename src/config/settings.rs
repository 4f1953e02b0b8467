//! Settings structures for client configuration

use crate::error::ApiError;
use crate::search::{PollConfig, SearchClient};
use crate::transport::HttpExecutor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Default API root
pub const DEFAULT_ROOT_URL: &str = "https://api.goshawk.io/v1";

/// File name probed in the working directory and the user config directory
const CONFIG_FILE_NAME: &str = "goshawk.yml";

/// Client settings loaded from YAML and `GOSHAWK_*` environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// API root URL
    pub root_url: String,
    /// Organization id the client operates on
    pub oid: String,
    /// API key sent as the bearer credential
    pub api_key: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Polling behavior for asynchronous jobs
    pub poll: PollSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_url: DEFAULT_ROOT_URL.to_string(),
            oid: String::new(),
            api_key: String::new(),
            timeout_secs: 30,
            poll: PollSettings::default(),
        }
    }
}

/// Polling knobs for job status loops
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    /// Maximum number of status requests per job
    pub max_attempts: u32,
    /// Floor for the wait between status requests, in seconds
    pub interval_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: crate::DEFAULT_MAX_POLL_ATTEMPTS,
            interval_secs: crate::DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ApiError::Config(format!("cannot read {}: {e}", path.display())))?;
        let settings: Settings = serde_yaml::from_str(&content)
            .map_err(|e| ApiError::Config(format!("invalid config {}: {e}", path.display())))?;
        Ok(settings)
    }

    /// Load settings from the first config source that exists, then
    /// apply environment overrides.
    ///
    /// Order: `GOSHAWK_CONFIG` path, `./goshawk.yml`, the user config
    /// directory, built-in defaults.
    pub fn load() -> Result<Self, ApiError> {
        let mut settings = match std::env::var("GOSHAWK_CONFIG") {
            // An explicit path must load; a missing file there is an error.
            Ok(path) => Self::from_file(path)?,
            Err(_) => match Self::discover_file() {
                Some(path) => Self::from_file(path)?,
                None => Self::default(),
            },
        };
        settings.merge_env();
        settings.validate()?;
        Ok(settings)
    }

    /// Merge with environment variables (GOSHAWK_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("GOSHAWK_ROOT_URL") {
            self.root_url = val;
        }
        if let Ok(val) = std::env::var("GOSHAWK_OID") {
            self.oid = val;
        }
        if let Ok(val) = std::env::var("GOSHAWK_API_KEY") {
            self.api_key = val;
        }
        if let Ok(val) = std::env::var("GOSHAWK_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.timeout_secs = secs;
            }
        }
    }

    /// Check internal consistency; a non-empty `oid` must be a UUID
    pub fn validate(&self) -> Result<(), ApiError> {
        if !self.oid.is_empty() && Uuid::parse_str(&self.oid).is_err() {
            return Err(ApiError::Config(format!(
                "organization id is not a valid UUID: {}",
                self.oid
            )));
        }
        Ok(())
    }

    /// Polling configuration derived from these settings
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            max_attempts: self.poll.max_attempts,
            poll_interval: Duration::from_secs(self.poll.interval_secs),
        }
    }

    /// Build a ready-to-use [`SearchClient`] from these settings.
    ///
    /// Requires a non-empty organization id and API key.
    pub fn build_client(&self) -> Result<SearchClient, ApiError> {
        self.validate()?;
        if self.oid.is_empty() {
            return Err(ApiError::Config("organization id is not set".to_string()));
        }
        if self.api_key.is_empty() {
            return Err(ApiError::Config("API key is not set".to_string()));
        }
        let executor = HttpExecutor::with_timeout(
            &self.root_url,
            &self.api_key,
            Duration::from_secs(self.timeout_secs),
        )?;
        Ok(SearchClient::new(Arc::new(executor), &self.oid))
    }

    fn discover_file() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            return Some(local);
        }
        let user = dirs::config_dir()?.join("goshawk").join(CONFIG_FILE_NAME);
        if user.is_file() {
            return Some(user);
        }
        None
    }
}
