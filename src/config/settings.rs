//! Daemon settings.
//!
//! Settings control the daemon itself (where the topology file lives, how reloads
//! are triggered, logging and metrics). They are read from an optional TOML file;
//! every field has a default so a minimal file, or none at all, works.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {0}")]
    Invalid(String),
}

/// Root settings for the daemon.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DaemonSettings {
    /// Path of the topology file.
    pub config_file: PathBuf,

    /// Reload-on-change settings.
    pub watch: WatchSettings,

    /// Logging and metrics settings.
    pub observability: ObservabilitySettings,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("/etc/athena/larvnet.conf"),
            watch: WatchSettings::default(),
            observability: ObservabilitySettings::default(),
        }
    }
}

/// Topology file watching.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchSettings {
    /// Reload when the topology file changes.
    pub enabled: bool,

    /// Poll interval for backends that cannot subscribe to changes, in seconds.
    pub poll_interval_secs: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: 2,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilitySettings {
    /// Log filter used when `RUST_LOG` is unset (e.g. "info", "larvnetd=debug").
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,

    /// Serve Prometheus metrics.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: "larvnetd=info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9190".to_string(),
        }
    }
}

impl DaemonSettings {
    /// Semantic checks serde cannot express.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.watch.enabled && self.watch.poll_interval_secs == 0 {
            return Err(SettingsError::Invalid("watch.poll_interval_secs must be > 0".into()));
        }
        if self.observability.metrics_enabled
            && self.observability.metrics_address.parse::<SocketAddr>().is_err()
        {
            return Err(SettingsError::Invalid(format!(
                "observability.metrics_address {} is not a socket address",
                self.observability.metrics_address
            )));
        }
        Ok(())
    }
}

/// Load and validate settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<DaemonSettings, SettingsError> {
    let content = fs::read_to_string(path)?;
    let settings: DaemonSettings = toml::from_str(&content)?;

    settings.validate()?;

    Ok(settings)
}
