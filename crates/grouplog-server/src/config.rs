//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Relay identity and moderation settings.
    #[serde(default)]
    pub relay: RelayConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "grouplog_moderation=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Relay identity and moderation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Hex public key the relay signs generated records as.
    #[serde(default)]
    pub pubkey: String,

    /// Pubkeys allowed to call the group administration routes.
    #[serde(default)]
    pub admin_pubkeys: Vec<String>,

    /// Idle seconds before the ordering offset returns to zero.
    #[serde(default = "default_serial_reset_secs")]
    pub serial_reset_secs: u64,
}

impl RelayConfig {
    pub fn serial_reset(&self) -> Duration {
        Duration::from_secs(self.serial_reset_secs)
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "grouplog.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    grouplog_db::DbRuntimeSettings::default().busy_timeout_ms
}

fn default_pool_max_size() -> u32 {
    grouplog_db::DbRuntimeSettings::default().pool_max_size
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_serial_reset_secs() -> u64 {
    grouplog_moderation::DEFAULT_RESET_AFTER.as_secs()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            pubkey: String::new(),
            admin_pubkeys: Vec::new(),
            serial_reset_secs: default_serial_reset_secs(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A setting is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Returns `true` for a 32-byte lowercase hex key.
pub(crate) fn is_hex_key(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

impl Config {
    /// Checks settings that have no usable default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first bad setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_hex_key(&self.relay.pubkey) {
            return Err(ConfigError::Invalid(
                "relay.pubkey must be a 64-character lowercase hex key".to_string(),
            ));
        }
        if let Some(bad) = self.relay.admin_pubkeys.iter().find(|k| !is_hex_key(k)) {
            return Err(ConfigError::Invalid(format!(
                "relay.admin_pubkeys contains an invalid key: {bad}"
            )));
        }
        if self.relay.serial_reset_secs == 0 {
            return Err(ConfigError::Invalid(
                "relay.serial_reset_secs must be greater than zero".to_string(),
            ));
        }
        if self.database.pool_max_size == 0 {
            return Err(ConfigError::Invalid(
                "database.pool_max_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `GROUPLOG_HOST` overrides `server.host`
/// - `GROUPLOG_PORT` overrides `server.port`
/// - `GROUPLOG_DB_PATH` overrides `database.path`
/// - `GROUPLOG_DB_BUSY_TIMEOUT_MS` overrides `database.busy_timeout_ms`
/// - `GROUPLOG_DB_POOL_MAX_SIZE` overrides `database.pool_max_size`
/// - `GROUPLOG_LOG_LEVEL` overrides `logging.level`
/// - `GROUPLOG_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `GROUPLOG_RELAY_PUBKEY` overrides `relay.pubkey`
/// - `GROUPLOG_ADMIN_PUBKEYS` overrides `relay.admin_pubkeys` (comma-separated)
/// - `GROUPLOG_SERIAL_RESET_SECS` overrides `relay.serial_reset_secs`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed, or
/// if the resulting configuration fails [`Config::validate`].
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Like [`load_config`], reading overrides through `env` instead of the
/// process environment.
pub fn load_config_with<F>(path: Option<&str>, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, env);
    config.validate()?;
    Ok(config)
}

fn apply_env_overrides<F>(config: &mut Config, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = env("GROUPLOG_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = env("GROUPLOG_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(db_path) = env("GROUPLOG_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(timeout) = env("GROUPLOG_DB_BUSY_TIMEOUT_MS") {
        if let Ok(parsed) = timeout.parse() {
            config.database.busy_timeout_ms = parsed;
        }
    }
    if let Some(size) = env("GROUPLOG_DB_POOL_MAX_SIZE") {
        if let Ok(parsed) = size.parse() {
            config.database.pool_max_size = parsed;
        }
    }
    if let Some(level) = env("GROUPLOG_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = env("GROUPLOG_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(pubkey) = env("GROUPLOG_RELAY_PUBKEY") {
        config.relay.pubkey = pubkey.trim().to_string();
    }
    if let Some(admins) = env("GROUPLOG_ADMIN_PUBKEYS") {
        config.relay.admin_pubkeys = admins
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(secs) = env("GROUPLOG_SERIAL_RESET_SECS") {
        if let Ok(parsed) = secs.parse() {
            config.relay.serial_reset_secs = parsed;
        }
    }
}
