//! TOML-based configuration for the ScreenLink server.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\ScreenLink\config.toml`
//! - Linux:    `~/.config/screenlink/config.toml`
//! - macOS:    `~/Library/Application Support/ScreenLink/config.toml`
//!
//! # Example file
//!
//! ```toml
//! [server]
//! log_level = "debug"
//! screen_name = "laptop"
//! protocol_version = "1.0"
//!
//! [network]
//! port = 24800
//!
//! [poller]
//! tick_interval_ms = 5
//! ```
//!
//! Every field has a `#[serde(default = "...")]`, so a missing file, a missing
//! section or a missing key all fall back to the built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use screenlink_core::{CursorPosition, ProtocolVersion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::harness::HarnessConfig;
use crate::application::poller::PollerConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// `protocol_version` is not of the form `major.minor`.
    #[error("invalid protocol_version {0:?}")]
    InvalidProtocolVersion(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub cursor: CursorConfig,
    #[serde(default)]
    pub poller: PollerSettings,
    #[serde(default)]
    pub harness: HarnessSettings,
}

/// General server behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Display name of the remote screen.
    #[serde(default = "default_screen_name")]
    pub screen_name: String,
    /// Protocol revision spoken to the peer, e.g. `"1.1"`.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
}

/// Listening socket settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// IP address to bind to.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Initial contents of the cursor-position cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CursorConfig {
    #[serde(default = "default_initial_x")]
    pub initial_x: i32,
    #[serde(default = "default_initial_y")]
    pub initial_y: i32,
}

/// Poller timing in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollerSettings {
    /// Pause between ticks; `0` ticks as fast as the scheduler allows.
    #[serde(default)]
    pub tick_interval_ms: u64,
    /// Re-check period while no automation bridge is registered.
    #[serde(default = "default_idle_interval_ms")]
    pub idle_interval_ms: u64,
}

/// Values the harness sends with screen-enter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessSettings {
    #[serde(default = "default_enter_sequence")]
    pub enter_sequence: u32,
    #[serde(default = "default_enter_modifier_mask")]
    pub enter_modifier_mask: u32,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_screen_name() -> String {
    "remote".to_string()
}
fn default_protocol_version() -> String {
    ProtocolVersion::V1_1.to_string()
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    24800
}
fn default_initial_x() -> i32 {
    1280
}
fn default_initial_y() -> i32 {
    562
}
fn default_idle_interval_ms() -> u64 {
    10
}
fn default_enter_sequence() -> u32 {
    25
}
fn default_enter_modifier_mask() -> u32 {
    8912
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            screen_name: default_screen_name(),
            protocol_version: default_protocol_version(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            initial_x: default_initial_x(),
            initial_y: default_initial_y(),
        }
    }
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 0,
            idle_interval_ms: default_idle_interval_ms(),
        }
    }
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            enter_sequence: default_enter_sequence(),
            enter_modifier_mask: default_enter_modifier_mask(),
        }
    }
}

// ── Conversions into runtime types ────────────────────────────────────────────

impl AppConfig {
    /// Parses `server.protocol_version`.
    ///
    /// Whether the revision is actually supported is checked later, when the
    /// proxy looks up its emission strategy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidProtocolVersion`] if the string is not
    /// `major.minor`.
    pub fn protocol_version(&self) -> Result<ProtocolVersion, ConfigError> {
        self.server
            .protocol_version
            .parse()
            .map_err(|_| ConfigError::InvalidProtocolVersion(self.server.protocol_version.clone()))
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            tick_interval: Duration::from_millis(self.poller.tick_interval_ms),
            idle_interval: Duration::from_millis(self.poller.idle_interval_ms),
        }
    }

    pub fn harness_config(&self) -> HarnessConfig {
        HarnessConfig {
            enter_sequence: self.harness.enter_sequence,
            enter_modifier_mask: self.harness.enter_modifier_mask,
        }
    }

    pub fn initial_cursor(&self) -> CursorPosition {
        CursorPosition::new(self.cursor.initial_x, self.cursor.initial_y)
    }

    /// `bind_address:port` for the listening socket.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.network.bind_address, self.network.port)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform path, returning defaults if the file
/// does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning defaults if it does not exist.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Resolves the platform config base directory including the `ScreenLink`
/// subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("ScreenLink"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("screenlink"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("ScreenLink")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── AppConfig defaults ────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_matches_documented_values() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.server.log_level, "info");
        assert_eq!(cfg.server.protocol_version, "1.1");
        assert_eq!(cfg.network.port, 24800);
        assert_eq!(cfg.initial_cursor(), CursorPosition::new(1280, 562));
        assert_eq!(cfg.harness_config(), HarnessConfig::default());
    }

    #[test]
    fn test_default_poller_settings_match_poller_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.poller_config(), PollerConfig::default());
    }

    #[test]
    fn test_listen_address_joins_host_and_port() {
        let mut cfg = AppConfig::default();
        cfg.network.bind_address = "127.0.0.1".to_string();
        cfg.network.port = 4000;

        assert_eq!(cfg.listen_address(), "127.0.0.1:4000");
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_toml_uses_defaults() {
        // Act
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");

        // Assert
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_section_overrides_only_named_keys() {
        // Arrange
        let toml_str = r#"
[server]
protocol_version = "1.0"

[poller]
tick_interval_ms = 5
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.protocol_version().unwrap(), ProtocolVersion::V1_0);
        assert_eq!(cfg.poller_config().tick_interval, Duration::from_millis(5));
        assert_eq!(cfg.poller_config().idle_interval, Duration::from_millis(10));
        assert_eq!(cfg.server.screen_name, "remote");
    }

    #[test]
    fn test_malformed_protocol_version_is_reported() {
        let mut cfg = AppConfig::default();
        cfg.server.protocol_version = "one.one".to_string();

        let result = cfg.protocol_version();

        assert!(matches!(result, Err(ConfigError::InvalidProtocolVersion(s)) if s == "one.one"));
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let result: Result<AppConfig, toml::de::Error> = toml::from_str("[[[ not valid toml");
        assert!(result.is_err());
    }

    // ── File round-trip ───────────────────────────────────────────────────────

    #[test]
    fn test_written_config_loads_back_from_path() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("screenlink-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.server.screen_name = "laptop".to_string();
        cfg.harness.enter_sequence = 7;

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, toml::to_string_pretty(&cfg).unwrap()).unwrap();

        // Act
        let restored = load_config_from(&path).expect("load");

        // Assert
        assert_eq!(restored, cfg);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::env::temp_dir()
            .join(format!("screenlink-missing-{}", uuid::Uuid::new_v4()))
            .join("config.toml");

        let cfg = load_config_from(&path).expect("missing file is not an error");

        assert_eq!(cfg, AppConfig::default());
    }
}
