// src/config/mod.rs
use std::path::PathBuf;
use serde::{Deserialize, Serialize};

use crate::engine::pending::MAX_PENDING_KEYS;

/// User-facing settings for the emulation layer. Persistence belongs to the
/// host; the engine only consumes the values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VimConfig {
    /// Master switch; when off the router intercepts nothing.
    pub enabled: bool,
    /// Longest in-progress key sequence before it is discarded.
    pub max_pending_keys: usize,
    /// How many yanked/deleted chunks the register keeps.
    pub register_history: usize,
}

impl Default for VimConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_pending_keys: MAX_PENDING_KEYS,
            register_history: 10,
        }
    }
}

impl VimConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path()?;
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::get_config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(config_path, contents)?;
        Ok(())
    }

    fn get_config_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|mut path| {
                path.push("vimode");
                path.push("config.toml");
                path
            })
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn load_from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn load_default() -> Result<Self, ConfigError> {
        Ok(Self::default())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}
