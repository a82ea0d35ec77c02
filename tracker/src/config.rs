use crate::error::Result;
use crate::error::TrackerError;
use serde::Deserialize;
use serde::Serialize;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "XTRAIL_CONFIG";

/// Configuration for the visit tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Hosts whose `/{user}/status/{id}` pages are tracked
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,

    /// Quiet period for mutation-driven checks
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Minimum spacing of tab-driven checks
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,

    /// Characters kept in `titleSummary` before the `...` marker
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,

    /// Period of the retention timer
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Buffered history notifications per listener
    #[serde(default = "default_notify_capacity")]
    pub notify_capacity: usize,

    /// Directory backing the JSON key/value store
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
}

fn default_hosts() -> Vec<String> {
    vec!["x.com".to_string(), "twitter.com".to_string()]
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_throttle_ms() -> u64 {
    1_000
}

fn default_summary_max_chars() -> usize {
    30
}

fn default_sweep_interval_secs() -> u64 {
    60 * 60
}

fn default_notify_capacity() -> usize {
    64
}

fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|base| base.join("xtrail"))
        .unwrap_or_else(|| PathBuf::from(".xtrail"))
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            debounce_ms: default_debounce_ms(),
            throttle_ms: default_throttle_ms(),
            summary_max_chars: default_summary_max_chars(),
            sweep_interval_secs: default_sweep_interval_secs(),
            notify_capacity: default_notify_capacity(),
            storage_dir: default_storage_dir(),
        }
    }
}

impl TrackerConfig {
    /// Load from `$XTRAIL_CONFIG` or the per-user config dir; defaults when
    /// no file exists.
    pub fn load() -> Result<Self> {
        Self::load_from(&resolve_config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|err| {
            TrackerError::Config(format!("failed to read config file {}: {err}", path.display()))
        })?;
        let config: TrackerConfig = toml::from_str(&raw).map_err(|err| {
            TrackerError::Config(format!("failed to parse TOML from {}: {err}", path.display()))
        })?;
        config.validate().map_err(TrackerError::Config)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.hosts.iter().all(|host| host.trim().is_empty()) {
            return Err("At least one tracked host is required".to_string());
        }

        if self.debounce_ms == 0 {
            return Err("Debounce window must be > 0".to_string());
        }

        if self.throttle_ms == 0 {
            return Err("Throttle window must be > 0".to_string());
        }

        if self.summary_max_chars == 0 {
            return Err("Summary length must be > 0".to_string());
        }

        if self.sweep_interval_secs == 0 {
            return Err("Sweep interval must be > 0".to_string());
        }

        if self.notify_capacity == 0 {
            return Err("Notification capacity must be > 0".to_string());
        }

        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn resolve_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_ENV_VAR) {
        return PathBuf::from(path);
    }

    if let Some(base) = dirs::config_dir() {
        return base.join("xtrail").join("config.toml");
    }

    PathBuf::from(".xtrail.toml")
}
