//! Checker configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::source::{FetchMode, RemoteSource, MIN_POLL_INTERVAL};

const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_BAN_STATUS: u16 = 403;

fn default_refresh_interval() -> Duration {
    DEFAULT_REFRESH_INTERVAL
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_ban_status() -> u16 {
    DEFAULT_BAN_STATUS
}

/// Serde support for durations written as (possibly fractional) seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_nanos() == 0 {
            serializer.serialize_u64(duration.as_secs())
        } else {
            serializer.serialize_f64(duration.as_secs_f64())
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|e| serde::de::Error::custom(format!("invalid duration {}: {}", secs, e)))
    }
}

/// Configuration for a [`crate::TorChecker`].
///
/// # Example (YAML)
///
/// ```yaml
/// mode: exit-nodes-only
/// refresh_interval_secs: 3600
/// cache_file: /var/cache/torlist/tor.txt
/// request_timeout_secs: 2.5
/// ban_status: 403
/// ban_payload: "Tor is not allowed"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mode: FetchMode,
    #[serde(
        rename = "refresh_interval_secs",
        with = "duration_secs",
        default = "default_refresh_interval"
    )]
    pub refresh_interval: Duration,
    /// Cache file path; unset disables caching.
    #[serde(default)]
    pub cache_file: Option<PathBuf>,
    #[serde(
        rename = "request_timeout_secs",
        with = "duration_secs",
        default = "default_request_timeout"
    )]
    pub request_timeout: Duration,
    /// Replaces the mode's default sources when set.
    #[serde(default)]
    pub sources: Option<Vec<RemoteSource>>,
    #[serde(default = "default_ban_status")]
    pub ban_status: u16,
    #[serde(default)]
    pub ban_payload: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: FetchMode::default(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            cache_file: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            sources: None,
            ban_status: DEFAULT_BAN_STATUS,
            ban_payload: String::new(),
        }
    }
}

impl Config {
    /// Create a configuration for a mode with defaults for everything else.
    pub fn new(mode: FetchMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Parse and validate a YAML configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Set the refresh interval.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the cache file.
    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_file = Some(path.into());
        self
    }

    /// Set the per-request download timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the remote sources.
    pub fn with_sources(mut self, sources: Vec<RemoteSource>) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Get the refresh interval.
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Get the request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Cache file path, treating an empty path as disabled.
    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    /// Sources for the configured mode, honoring the override.
    pub fn effective_sources(&self) -> Vec<RemoteSource> {
        if !self.mode.uses_network() {
            return Vec::new();
        }
        match &self.sources {
            Some(sources) => sources.clone(),
            None => self.mode.sources(),
        }
    }

    /// Check the configuration for values that cannot work.
    ///
    /// Polling faster than the providers allow is only warned about.
    pub fn validate(&self) -> Result<()> {
        if self.mode != FetchMode::Disabled && self.refresh_interval.is_zero() {
            return Err(Error::Config(
                "refresh interval must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        if !(100..=999).contains(&self.ban_status) {
            return Err(Error::Config(format!(
                "invalid ban_status: {}",
                self.ban_status
            )));
        }
        if self.mode.uses_network() {
            if let Some(sources) = &self.sources {
                if sources.is_empty() {
                    return Err(Error::Config(
                        "sources override must not be empty".to_string(),
                    ));
                }
            }
            if self.refresh_interval() < MIN_POLL_INTERVAL {
                log::warn!(
                    "Refresh interval {:?} is below the {:?} providers allow; the source may block this host",
                    self.refresh_interval,
                    MIN_POLL_INTERVAL
                );
            }
        }
        Ok(())
    }
}
