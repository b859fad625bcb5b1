//! Relay configuration, stored as JSON in the per-user config directory.

use crate::RELAY_NAME;
use crate::arbiter::lock_path_for;
use crate::channel::{ChannelAddress, ServerSettings};
use crate::error::config::ConfigError;
use crate::host::HostClass;
use crate::resolver::{
    DEFAULT_GOTO_COMMAND, DEFAULT_OPEN_FILE_COMMAND, DEFAULT_POLL_BUDGET, DEFAULT_POLL_INTERVAL,
    ResolverSettings,
};

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_VERSION: u32 = 1;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Program started for launches and command-line fallbacks.
    #[serde(default = "default_executable")]
    pub executable: String,
    /// Process name that identifies a running host.
    #[serde(default = "default_process_name")]
    pub process_name: String,
    /// Extensions (without the dot) of project descriptor files.
    #[serde(default = "default_project_extensions")]
    pub project_extensions: Vec<String>,
    #[serde(default = "default_open_file_command")]
    pub open_file_command: String,
    #[serde(default = "default_goto_command")]
    pub goto_command: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            process_name: default_process_name(),
            project_extensions: default_project_extensions(),
            open_file_command: default_open_file_command(),
            goto_command: default_goto_command(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default = "default_channel_name")]
    pub name: String,
    #[serde(default = "default_channel_name")]
    pub lock_name: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: default_channel_name(),
            lock_name: default_channel_name(),
            connect_timeout_ms: default_connect_timeout_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_poll_budget_ms")]
    pub poll_budget_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            poll_budget_ms: default_poll_budget_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub host: HostConfig,

    #[serde(default)]
    pub channel: ChannelConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            host: HostConfig::default(),
            channel: ChannelConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_executable() -> String {
    "devenv".to_string()
}
fn default_process_name() -> String {
    "devenv".to_string()
}
fn default_project_extensions() -> Vec<String> {
    vec!["sln".to_string()]
}
fn default_open_file_command() -> String {
    DEFAULT_OPEN_FILE_COMMAND.to_string()
}
fn default_goto_command() -> String {
    DEFAULT_GOTO_COMMAND.to_string()
}
fn default_channel_name() -> String {
    RELAY_NAME.to_string()
}
fn default_connect_timeout_ms() -> u64 {
    1000
}
fn default_retry_backoff_ms() -> u64 {
    250
}
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}
fn default_poll_budget_ms() -> u64 {
    DEFAULT_POLL_BUDGET.as_millis() as u64
}

// ============================================
// IMPLEMENTATION
// ============================================

impl RelayConfig {
    /// Per-user directory the config file lives in, if the platform has one.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(RELAY_NAME))
    }

    /// Load config from {config_dir}/config.json.
    ///
    /// # Returns
    ///
    /// Returns `Ok(RelayConfig)` if loaded successfully or defaults if file missing.
    /// Returns `Err(ConfigError)` if file exists but is corrupted/invalid.
    #[track_caller]
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::Read {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: RelayConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::Parse {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Like [`RelayConfig::load`], but any failure falls back to defaults.
    pub fn load_or_default(config_dir: &Path) -> Self {
        Self::load(config_dir).unwrap_or_else(|e| {
            warn!("Using default config: {e}");
            Self::default()
        })
    }

    /// Save config to {config_dir}/config.json using temp file + rename.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation, directory creation,
    /// serialization, write or rename fails.
    #[track_caller]
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::Write {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::Write {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::Write {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any value is invalid.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(validation(format!(
                "Invalid version: {} (expected 1-{})",
                self.version, CONFIG_VERSION
            )));
        }

        let required = [
            ("host.executable", &self.host.executable),
            ("host.process_name", &self.host.process_name),
            ("host.open_file_command", &self.host.open_file_command),
            ("host.goto_command", &self.host.goto_command),
            ("channel.name", &self.channel.name),
            ("channel.lock_name", &self.channel.lock_name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(validation(format!("{field} cannot be empty")));
            }
        }

        if self
            .host
            .project_extensions
            .iter()
            .all(|extension| extension.trim_start_matches('.').trim().is_empty())
        {
            return Err(validation(
                "host.project_extensions needs at least one extension".to_string(),
            ));
        }

        let intervals = [
            ("channel.connect_timeout_ms", self.channel.connect_timeout_ms),
            ("channel.retry_backoff_ms", self.channel.retry_backoff_ms),
            ("resolver.poll_interval_ms", self.resolver.poll_interval_ms),
            ("resolver.poll_budget_ms", self.resolver.poll_budget_ms),
        ];
        for (field, value) in intervals {
            if value == 0 {
                return Err(validation(format!("{field} must be greater than 0")));
            }
        }

        if self.resolver.poll_interval_ms > self.resolver.poll_budget_ms {
            return Err(validation(format!(
                "resolver.poll_interval_ms ({}) exceeds resolver.poll_budget_ms ({})",
                self.resolver.poll_interval_ms, self.resolver.poll_budget_ms
            )));
        }

        Ok(())
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            poll_interval: Duration::from_millis(self.resolver.poll_interval_ms),
            poll_budget: Duration::from_millis(self.resolver.poll_budget_ms),
            open_file_command: self.host.open_file_command.clone(),
            goto_command: self.host.goto_command.clone(),
        }
    }

    pub fn server_settings(&self) -> ServerSettings {
        ServerSettings {
            retry_backoff: Duration::from_millis(self.channel.retry_backoff_ms),
            ..ServerSettings::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.channel.connect_timeout_ms)
    }

    pub fn channel_address(&self) -> ChannelAddress {
        ChannelAddress::for_name(&self.channel.name)
    }

    pub fn lock_path(&self) -> PathBuf {
        lock_path_for(&self.channel.lock_name)
    }

    pub fn host_class(&self) -> HostClass {
        HostClass::new(&self.host.process_name)
    }
}

#[track_caller]
fn validation(reason: String) -> ConfigError {
    ConfigError::Validation {
        location: ErrorLocation::from(Location::caller()),
        reason,
    }
}
