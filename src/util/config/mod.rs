//! Bridge configuration
//!
//! # Configuration lookup
//!
//! ```text
//! Priority (high → low):
//! 1. Explicit path (CLI --config)
//! 2. $NWSCRIPT_BRIDGE_CONFIG
//! 3. User-level (~/.config/nwscript-bridge/config.toml)
//! 4. Default values
//! ```
//!
//! # Example
//!
//! ```toml
//! [runtime]
//! string_encoding = "utf8"
//! default_return_code = -1
//!
//! [log]
//! level = "debug"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bridge::channel::DEFAULT_CHANNEL_DEPTH;
use crate::bridge::neutral::{StringEncoding, DEFAULT_NEUTRAL_LIMIT};
use crate::bridge::value::ObjectId;
use crate::util::logger::LogLevel;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "NWSCRIPT_BRIDGE_CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BridgeConfig {
    /// Per-instance runtime settings
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Encoding of neutral string buffers
    #[serde(default)]
    pub string_encoding: StringEncoding,
    /// Object id used when an object parameter does not parse
    #[serde(default = "default_invalid_object_id")]
    pub invalid_object_id: u32,
    /// Return code reported when an entry point returns nothing
    #[serde(default)]
    pub default_return_code: i32,
    /// Operand channel depth limit
    #[serde(default = "default_max_channel_depth")]
    pub max_channel_depth: usize,
    /// Live neutral string byte limit
    #[serde(default = "default_max_neutral_bytes")]
    pub max_neutral_bytes: usize,
    /// Allow saved states to be pushed to / popped from a channel
    #[serde(default = "default_save_state_to_stack")]
    pub save_state_to_stack: bool,
    /// Trace every operand push and pop
    #[serde(default)]
    pub verbose: bool,
}

fn default_invalid_object_id() -> u32 {
    ObjectId::INVALID.raw()
}

fn default_max_channel_depth() -> usize {
    DEFAULT_CHANNEL_DEPTH
}

fn default_max_neutral_bytes() -> usize {
    DEFAULT_NEUTRAL_LIMIT
}

fn default_save_state_to_stack() -> bool {
    true
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            string_encoding: StringEncoding::default(),
            invalid_object_id: default_invalid_object_id(),
            default_return_code: 0,
            max_channel_depth: DEFAULT_CHANNEL_DEPTH,
            max_neutral_bytes: DEFAULT_NEUTRAL_LIMIT,
            save_state_to_stack: true,
            verbose: false,
        }
    }
}

impl RuntimeConfig {
    pub fn invalid_object(&self) -> ObjectId {
        ObjectId(self.invalid_object_id)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub level: LogLevel,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Get the user config directory
pub fn get_config_dir() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join("nwscript-bridge"));
    }

    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join("nwscript-bridge"));
    }

    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join("nwscript-bridge"));
    }

    None
}

/// Get the user config file path
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Pick the config file to read, following the lookup order.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    get_config_path()
}

/// Parse configuration text.
pub fn parse_config(content: &str) -> Result<BridgeConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load configuration from a file.
pub fn load_config_from(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Load configuration following the lookup order.
/// Returns defaults when no file exists.
pub fn load_config(explicit: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    match resolve_config_path(explicit) {
        Some(path) if explicit.is_some() || path.exists() => load_config_from(&path),
        _ => Ok(BridgeConfig::default()),
    }
}

/// Render configuration as TOML.
pub fn render_config(config: &BridgeConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

/// Write configuration, creating parent directories.
pub fn save_config(
    config: &BridgeConfig,
    path: &Path,
) -> Result<(), ConfigError> {
    let io_error = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir).map_err(io_error)?;
        }
    }

    let content = render_config(config)?;
    fs::write(path, content).map_err(io_error)?;
    Ok(())
}

#[cfg(test)]
mod tests;
