//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::sync::Semaphore;

use crate::signaling::RoutePolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub rooms: RoomsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> usize {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_connections: default_max_connections(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `max_connections`, capped at what a semaphore can hold
    pub fn connection_limit(&self) -> usize {
        self.max_connections.min(Semaphore::MAX_PERMITS)
    }
}

/// Room policy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RoomsConfig {
    /// Remove a room from the registry when its last member leaves
    #[serde(default = "default_true")]
    pub reap_empty: bool,

    /// Send `room-full` to a joiner that was turned away
    #[serde(default = "default_true")]
    pub notify_room_full: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            reap_empty: true,
            notify_room_full: true,
        }
    }
}

impl From<&RoomsConfig> for RoutePolicy {
    fn from(config: &RoomsConfig) -> Self {
        RoutePolicy {
            reap_empty: config.reap_empty,
            notify_room_full: config.notify_room_full,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment.
    ///
    /// Runs before logging is set up, so what happened is returned in the
    /// [`LoadReport`] instead of being logged here.
    pub fn load_default() -> (Self, LoadReport) {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("signal-relay").join("config.toml")),
            Some(PathBuf::from("/etc/signal-relay/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::load_first(&config_paths)
    }

    /// Load the first candidate that exists and parses
    fn load_first(paths: &[PathBuf]) -> (Self, LoadReport) {
        let mut report = LoadReport::default();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load_with_env(path) {
                Ok(config) => {
                    report.loaded_from = Some(path.clone());
                    return (config, report);
                }
                Err(e) => report.skipped.push(e),
            }
        }

        (Self::from_env(), report)
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(host) = var("SIGNAL_RELAY_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("SIGNAL_RELAY_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Some(max) = var("SIGNAL_RELAY_MAX_CONNECTIONS") {
            if let Ok(m) = max.parse() {
                self.server.max_connections = m;
            }
        }

        if let Some(level) = var("SIGNAL_RELAY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("SIGNAL_RELAY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Outcome of [`Config::load_default`]
#[derive(Debug, Default)]
pub struct LoadReport {
    /// File the config came from; `None` means defaults plus environment
    pub loaded_from: Option<PathBuf>,
    /// Candidate files that exist but could not be loaded
    pub skipped: Vec<ConfigError>,
}

impl LoadReport {
    /// Log the outcome; call once tracing is initialized
    pub fn log(&self) {
        for error in &self.skipped {
            tracing::warn!("Failed to load config: {}", error);
        }
        match &self.loaded_from {
            Some(path) => tracing::info!("Loaded config from {:?}", path),
            None => tracing::info!("Using default config with environment overrides"),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Signal Relay Configuration
#
# Environment variables override these settings:
# - SIGNAL_RELAY_HOST
# - SIGNAL_RELAY_PORT
# - SIGNAL_RELAY_MAX_CONNECTIONS
# - SIGNAL_RELAY_LOG_LEVEL
# - SIGNAL_RELAY_LOG_FORMAT

[server]
# Address to listen on
host = "0.0.0.0"

# Port for WebSocket and health endpoints
port = 3000

# Concurrent WebSocket connections accepted before new ones are turned away
max_connections = 1000

[rooms]
# Drop a room as soon as its last participant leaves
reap_empty = true

# Send {"cmd":"room-full"} to a joiner when the room already has two participants
notify_room_full = true

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
