//! Client configuration
//!
//! Settings are resolved in layers:
//! 1. Environment variables (highest priority)
//! 2. Configuration file (TOML format)
//! 3. Default values (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Production API root used when no usable base URL is configured
pub const DEFAULT_BASE_URL: &str = "https://usekrucible.com/api";

/// Top-level configuration file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KrucibleConfig {
    /// Account and credentials
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Provisioning wait behaviour
    #[serde(default)]
    pub polling: PollConfig,
}

/// Account and credentials used for every request
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// API root, e.g. `https://usekrucible.com/api`. Empty means the default.
    pub base_url: String,
    pub account_id: String,
    pub api_key_id: String,
    pub api_key_secret: String,
}

impl ConnectionConfig {
    pub fn new(
        account_id: impl Into<String>,
        api_key_id: impl Into<String>,
        api_key_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: String::new(),
            account_id: account_id.into(),
            api_key_id: api_key_id.into(),
            api_key_secret: api_key_secret.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Base URL the client will talk to.
    ///
    /// Falls back to [`DEFAULT_BASE_URL`] when the configured value is empty
    /// or not an absolute `http(s)` URL. A usable value is returned as given.
    pub fn resolved_base_url(&self) -> String {
        match url::Url::parse(&self.base_url) {
            Ok(parsed)
                if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() =>
            {
                self.base_url.clone()
            }
            _ => DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Account-scoped prefix applied to every request path
    pub fn account_url(&self) -> String {
        let base = self.resolved_base_url();
        let base = base.trim_end_matches('/');
        let account_id = self.account_id.trim_matches('/');

        if account_id.is_empty() {
            format!("{}/accounts", base)
        } else {
            format!("{}/accounts/{}", base, urlencoding::encode(account_id))
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("base_url", &self.base_url)
            .field("account_id", &self.account_id)
            .field("api_key_id", &self.api_key_id)
            .field("api_key_secret", &"<redacted>")
            .finish()
    }
}

/// How long-running creations are awaited.
///
/// The defaults wait indefinitely at a one second interval and refuse to
/// treat unknown states as success. The service does not publish its full
/// state taxonomy, so terminal failure states are configured here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Delay between refreshes while a resource is provisioning
    pub interval_ms: u64,
    /// Upper bound on the whole wait. `None` waits until the state changes.
    pub timeout_ms: Option<u64>,
    /// States that mean provisioning has failed
    pub failure_states: Vec<String>,
    /// Treat states other than `ready` and `failure_states` as settled
    pub accept_unrecognized_states: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            timeout_ms: None,
            failure_states: Vec::new(),
            accept_unrecognized_states: false,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_failure_state(mut self, state: impl Into<String>) -> Self {
        self.failure_states.push(state.into());
        self
    }

    pub fn accepting_unrecognized_states(mut self) -> Self {
        self.accept_unrecognized_states = true;
        self
    }

    pub fn is_failure_state(&self, state: &str) -> bool {
        self.failure_states.iter().any(|s| s == state)
    }
}

impl KrucibleConfig {
    /// Load configuration from the environment and an optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;

        toml::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            std::env::var("KRUCIBLE_CONFIG").ok().map(PathBuf::from),
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".config/krucible/config.toml")),
            Some(PathBuf::from("./krucible.toml")),
        ];

        paths.into_iter().flatten().find(|p| p.exists())
    }

    /// Apply overrides from a variable lookup (the process environment in `load`)
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("KRUCIBLE_BASE_URL") {
            self.connection.base_url = url;
        }
        if let Some(account) = lookup("KRUCIBLE_ACCOUNT_ID") {
            self.connection.account_id = account;
        }
        if let Some(id) = lookup("KRUCIBLE_API_KEY_ID") {
            self.connection.api_key_id = id;
        }
        if let Some(secret) = lookup("KRUCIBLE_API_KEY_SECRET") {
            self.connection.api_key_secret = secret;
        }

        if let Some(interval) = lookup("KRUCIBLE_POLL_INTERVAL_MS") {
            if let Ok(interval) = interval.parse() {
                self.polling.interval_ms = interval;
            }
        }
        if let Some(timeout) = lookup("KRUCIBLE_POLL_TIMEOUT_MS") {
            if let Ok(timeout) = timeout.parse() {
                self.polling.timeout_ms = Some(timeout);
            }
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0:?}: {1}")]
    FileRead(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
