//! notifywatch configuration types and loading

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Smallest accepted poll interval in seconds
pub const MIN_POLL_INTERVAL_SECS: u64 = 1;

/// Largest accepted poll interval in seconds
pub const MAX_POLL_INTERVAL_SECS: u64 = 3600;

/// Main notifywatch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Notifications API configuration
    pub api: ApiConfig,

    /// Timed polling configuration
    pub polling: PollingConfig,

    /// Push channel configuration
    pub push: PushConfig,

    /// On-screen popup configuration
    pub popups: PopupConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Debug mode raises the default log level to DEBUG
    pub debug: bool,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        debug!("Config::validate: called");
        if self.api.domain.trim().is_empty() {
            return Err(eyre!("api.domain must not be empty"));
        }

        let interval = self.polling.interval_secs;
        if !(MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS).contains(&interval) {
            return Err(eyre!(
                "polling.interval-secs must be between {} and {} (got {})",
                MIN_POLL_INTERVAL_SECS,
                MAX_POLL_INTERVAL_SECS,
                interval
            ));
        }

        if self.push.enabled && !(self.push.url.starts_with("ws://") || self.push.url.starts_with("wss://")) {
            return Err(eyre!("push.url must start with ws:// or wss:// (got {})", self.push.url));
        }

        if self.push.reconnect_base_ms == 0 || self.push.reconnect_base_ms > self.push.reconnect_max_ms {
            return Err(eyre!(
                "push.reconnect-base-ms must be non-zero and not exceed push.reconnect-max-ms ({} > {})",
                self.push.reconnect_base_ms,
                self.push.reconnect_max_ms
            ));
        }

        if self.push.heartbeat_secs == 0 {
            return Err(eyre!("push.heartbeat-secs must be at least 1"));
        }

        if self.popups.capacity == 0 {
            return Err(eyre!("popups.capacity must be at least 1"));
        }

        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        debug!(?config_path, "Config::load: called");
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::search_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log settings, before logging is initialized
    ///
    /// Never fails: a missing or broken config yields `None`.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let config = match config_path {
            Some(path) => Self::load_from_file(path).ok()?,
            None => Self::search_paths()
                .into_iter()
                .filter(|p| p.exists())
                .find_map(|p| Self::load_from_file(p).ok())?,
        };

        config
            .log_level
            .or_else(|| config.debug.then(|| "DEBUG".to_string()))
    }

    /// Project-local config first, then the user config directory
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".notifywatch.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("notifywatch").join("notifywatch.yml"));
        }
        paths
    }

    /// Write configuration as YAML, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Config::save: called");
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Notifications API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend base URL (scheme, host and port)
    pub domain: String,

    /// Optional project filter; empty means all projects
    pub project: String,

    /// Timeout for fetch and acknowledge requests in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Timeout for the connectivity probe in milliseconds
    #[serde(rename = "probe-timeout-ms")]
    pub probe_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            domain: "http://localhost:9204".to_string(),
            project: String::new(),
            timeout_ms: 10_000,
            probe_timeout_ms: 5_000,
        }
    }
}

impl ApiConfig {
    /// Base endpoint for notification records
    pub fn endpoint(&self) -> String {
        format!("{}/api/notifications", self.domain.trim_end_matches('/'))
    }

    /// Project filter, if one is configured
    pub fn project_filter(&self) -> Option<&str> {
        let project = self.project.trim();
        (!project.is_empty()).then_some(project)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Timed polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Seconds between poll cycles (1..=3600)
    #[serde(rename = "interval-secs")]
    pub interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}

impl PollingConfig {
    /// Get the poll interval as a Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Push channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Whether to open a push channel at all
    pub enabled: bool,

    /// WebSocket endpoint
    pub url: String,

    /// Seconds between outbound heartbeat pings
    #[serde(rename = "heartbeat-secs")]
    pub heartbeat_secs: u64,

    /// Reconnect delay per attempt in milliseconds
    #[serde(rename = "reconnect-base-ms")]
    pub reconnect_base_ms: u64,

    /// Upper bound on the reconnect delay in milliseconds
    #[serde(rename = "reconnect-max-ms")]
    pub reconnect_max_ms: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "ws://localhost:9204/ws".to_string(),
            heartbeat_secs: 30,
            reconnect_base_ms: 5_000,
            reconnect_max_ms: 30_000,
        }
    }
}

impl PushConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    pub fn reconnect_base(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_ms)
    }

    pub fn reconnect_max(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_ms)
    }
}

/// Screen area popups are stacked in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkArea {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Default for WorkArea {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
        }
    }
}

/// On-screen popup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    /// Maximum popups on screen at once
    pub capacity: usize,

    /// Popup width in pixels
    pub width: i32,

    /// Popup height in pixels
    pub height: i32,

    /// Gap between popups and from the work area edge
    pub margin: i32,

    /// Auto-dismiss delay in milliseconds
    #[serde(rename = "duration-ms")]
    pub duration_ms: u64,

    #[serde(rename = "work-area")]
    pub work_area: WorkArea,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            width: 350,
            height: 120,
            margin: 60,
            duration_ms: 5_000,
            work_area: WorkArea::default(),
        }
    }
}

impl PopupConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}
