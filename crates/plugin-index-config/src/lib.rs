//! Configuration for plugin-index.
//!
//! Settings are read from `plugin-index.toml`. Every field has a default, so
//! an absent file behaves like an empty one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name looked up in the platform config directory.
pub const CONFIG_FILE: &str = "plugin-index.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub host: HostConfig,
    pub ci: CiConfig,
    pub bundled: BundledConfig,
    pub catalog: CatalogConfig,
    /// Extra descriptions for bundled plugins, by plugin name
    pub descriptions: BTreeMap<String, String>,
}

/// The running host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HostConfig {
    /// Running host version; empty resolves to the development line
    pub version: String,
    /// Archive the host runs from, if it is a single-archive distribution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CiConfig {
    pub enabled: bool,
    /// CI server base URL; the CI source is skipped when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub view_prefix: String,
    /// First version not yet released
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_version: Option<String>,
    /// Lifetime of cached listings; unset keeps them forever
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,
    pub timeout_secs: u64,
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            view_prefix: "Plugins-".to_string(),
            next_version: None,
            cache_ttl_secs: None,
            timeout_secs: 30,
        }
    }
}

impl CiConfig {
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BundledConfig {
    pub enabled: bool,
    pub plugins_dir: String,
    pub name_attribute: String,
    pub version_attribute: String,
}

impl Default for BundledConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            plugins_dir: "WEB-INF/plugins/".to_string(),
            name_attribute: "Gerrit-PluginName".to_string(),
            version_attribute: "Implementation-Version".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CatalogConfig {
    /// Warm the catalog for the host version in the background
    pub preload: bool,
}

impl Config {
    /// Parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate config text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.ci.url {
            let parsed = reqwest::Url::parse(url).map_err(|e| {
                ConfigError::ValidationError(format!("ci.url '{}': {}", url, e))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::ValidationError(format!(
                    "ci.url '{}': expected an http or https URL",
                    url
                )));
            }
        }

        if let Some(next) = &self.ci.next_version {
            if next.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "ci.next-version must not be blank".to_string(),
                ));
            }
        }

        if self.ci.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "ci.timeout-secs must be greater than zero".to_string(),
            ));
        }

        if self.bundled.name_attribute.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "bundled.name-attribute must not be blank".to_string(),
            ));
        }

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// The config file to read: `explicit` if given, else the platform default if it exists.
pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_path().filter(|path| path.exists()),
    }
}

/// Platform config location, e.g. `~/.config/plugin-index/plugin-index.toml`.
pub fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "plugin-index", "plugin-index")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
