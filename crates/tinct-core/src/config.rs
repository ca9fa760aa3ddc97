//! Session configuration.
//!
//! ## Learning: Serde Defaults
//!
//! `#[serde(default)]` on each struct fills any missing field from
//! `Default::default()`, so a config file only needs the keys it changes
//! and older files keep loading after new settings are added.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tinct_theme::ThemeKind;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where versions and drafts are stored
    pub storage: StorageConfig,

    /// The theme this tool writes
    pub theme: ThemeConfig,

    /// Live preview behaviour
    pub preview: PreviewConfig,

    /// The editor host
    pub host: HostConfig,
}

impl Config {
    /// Loads config from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Using default config: {}", err);
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("tinct").join("config.toml"))
    }

    /// Saves the config to a file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Version store directory (defaults to `<data dir>/tinct`)
    pub root: Option<PathBuf>,
}

impl StorageConfig {
    pub fn root_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => {
                let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
                Ok(data_dir.join("tinct"))
            }
        }
    }
}

/// Output theme configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Name of the generated theme
    pub name: String,

    /// Light or dark
    pub kind: ThemeKind,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: "Tinct Custom".to_string(),
            kind: ThemeKind::Dark,
        }
    }
}

/// Live preview configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Write the theme while editing
    pub enabled: bool,

    /// Quiet period before a preview write (ms)
    pub debounce_ms: u64,
}

impl PreviewConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 300,
        }
    }
}

/// Host configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// How long to wait for the host to answer a request (ms)
    pub request_timeout_ms: u64,

    /// Extension directory holding `package.json` and `themes/`
    pub extension_dir: Option<PathBuf>,

    /// Theme file to customize (defaults to the first manifest entry)
    pub active_theme: Option<PathBuf>,

    /// Editor settings file (defaults to `settings.json` in the extension directory)
    pub settings_path: Option<PathBuf>,
}

impl HostConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5000,
            extension_dir: None,
            active_theme: None,
            settings_path: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("Data directory not found")]
    NoDataDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
