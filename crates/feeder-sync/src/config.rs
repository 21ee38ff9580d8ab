//! # Feeder Configuration
//!
//! Where the feeder lives and how to stay connected to it.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FEEDER_DEVICE_URL=ws://10.0.0.7:81/                                │
//! │     FEEDER_DEVICE_HOST / FEEDER_DEVICE_PORT                            │
//! │     FEEDER_RECONNECT_DELAY_SECS=5                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $FEEDER_CONFIG, or                                                 │
//! │     ~/.config/feeder/feeder.toml (Linux)                               │
//! │     ~/Library/Application Support/com.feeder.feeder/feeder.toml        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     ws://192.168.1.100:81/, 5s reconnect delay                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [device]
//! host = "192.168.1.100"
//! port = 81
//! # url = "ws://192.168.1.100:81/"   # wins over host/port
//!
//! [connection]
//! connect_timeout_secs = 10
//! reconnect_delay_secs = 5
//! ping_interval_secs = 30
//!
//! [[schedule.defaults]]
//! time = "08:00"
//! amount = 50
//! enabled = true
//! ```

use feeder_core::schedule::default_drafts;
use feeder_core::ScheduleDraft;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};
use crate::transport::TransportConfig;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "FEEDER_CONFIG";

// =============================================================================
// Device Settings
// =============================================================================

/// Where the feeder's WebSocket server is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Hostname or IP of the feeder.
    #[serde(default = "default_host")]
    pub host: String,

    /// WebSocket port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Full URL. Overrides `host` and `port` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

fn default_host() -> String {
    "192.168.1.100".to_string()
}

fn default_port() -> u16 {
    81
}

impl Default for DeviceSettings {
    fn default() -> Self {
        DeviceSettings {
            host: default_host(),
            port: default_port(),
            url: None,
        }
    }
}

// =============================================================================
// Connection Settings
// =============================================================================

/// Timing of the connection to the feeder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Handshake timeout (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Fixed delay before each reconnect attempt (seconds).
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,

    /// WebSocket ping interval (seconds).
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
}

fn default_connect_timeout() -> u64 {
    10
}
fn default_reconnect_delay() -> u64 {
    5
}
fn default_ping_interval() -> u64 {
    30
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        ConnectionSettings {
            connect_timeout_secs: default_connect_timeout(),
            reconnect_delay_secs: default_reconnect_delay(),
            ping_interval_secs: default_ping_interval(),
        }
    }
}

// =============================================================================
// Schedule Settings
// =============================================================================

/// Editor contents before the device reports its schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    #[serde(default = "default_drafts")]
    pub defaults: Vec<ScheduleDraft>,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        ScheduleSettings {
            defaults: default_drafts(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeederConfig {
    #[serde(default)]
    pub device: DeviceSettings,

    #[serde(default)]
    pub connection: ConnectionSettings,

    #[serde(default)]
    pub schedule: ScheduleSettings,
}

impl FeederConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `$FEEDER_CONFIG` or the platform path)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let path = config_path
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
            .or_else(Self::default_config_path);

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Reads one TOML file. A missing file yields the defaults.
    pub fn from_file(path: &std::path::Path) -> SyncResult<Self> {
        if !path.exists() {
            debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        info!(?path, "Loading feeder config from file");
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Feeder config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        self.endpoint_url()?;

        if self.connection.connect_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "connect_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.connection.reconnect_delay_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "reconnect_delay_secs must be greater than 0".into(),
            ));
        }

        if self.connection.ping_interval_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "ping_interval_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies overrides from a key lookup (the process environment in
    /// [`FeederConfig::load`]).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("FEEDER_DEVICE_HOST") {
            debug!(%host, "Overriding device host from environment");
            self.device.host = host;
        }

        if let Some(port) = lookup("FEEDER_DEVICE_PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.device.port = p,
                Err(_) => warn!(%port, "Ignoring invalid FEEDER_DEVICE_PORT"),
            }
        }

        if let Some(url) = lookup("FEEDER_DEVICE_URL") {
            debug!(%url, "Overriding device URL from environment");
            self.device.url = Some(url);
        }

        if let Some(delay) = lookup("FEEDER_RECONNECT_DELAY_SECS") {
            match delay.parse::<u64>() {
                Ok(d) => self.connection.reconnect_delay_secs = d,
                Err(_) => warn!(%delay, "Ignoring invalid FEEDER_RECONNECT_DELAY_SECS"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "feeder", "feeder")
            .map(|dirs| dirs.config_dir().join("feeder.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The feeder's WebSocket URL. Only plain `ws://` is accepted.
    pub fn endpoint_url(&self) -> SyncResult<Url> {
        let raw = match &self.device.url {
            Some(url) => url.clone(),
            None => {
                if self.device.host.trim().is_empty() {
                    return Err(SyncError::InvalidConfig("device host is empty".into()));
                }
                format!("ws://{}:{}/", self.device.host.trim(), self.device.port)
            }
        };

        let url = Url::parse(&raw)?;
        if url.scheme() != "ws" {
            return Err(SyncError::InvalidUrl(format!(
                "Device URL must start with ws://, got: {}",
                raw
            )));
        }
        if url.host_str().is_none() {
            return Err(SyncError::InvalidUrl(format!("Device URL has no host: {}", raw)));
        }

        Ok(url)
    }

    /// Builds the transport settings.
    pub fn transport_config(&self) -> SyncResult<TransportConfig> {
        Ok(TransportConfig {
            url: self.endpoint_url()?.to_string(),
            connect_timeout: Duration::from_secs(self.connection.connect_timeout_secs),
            reconnect_delay: Duration::from_secs(self.connection.reconnect_delay_secs),
            ping_interval: Duration::from_secs(self.connection.ping_interval_secs),
        })
    }
}
