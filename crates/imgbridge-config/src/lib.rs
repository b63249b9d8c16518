//! Configuration for the image bridge.
//!
//! Supports an optional TOML file; every section has defaults, so the bridge
//! works with zero config.
//!
//! # Config file locations
//!
//! Priority order:
//! 1. `$IMGBRIDGE_CONFIG` environment variable
//! 2. The platform config dir (`directories`), e.g.
//!    `~/Library/Application Support/imgbridge/config.toml` on macOS
//! 3. `~/.config/imgbridge/config.toml`

use imgbridge_protocol::method;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const MIB: usize = 1024 * 1024;

/// Upper bound for `store.quota_mib`.
pub const MAX_QUOTA_MIB: u32 = 4096;

/// Upper bound for `store.max_image_mib`: the largest image one frame can carry.
pub const MAX_IMAGE_MIB: u32 = (imgbridge_protocol::MAX_IMAGE_BYTES / MIB) as u32;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct BridgeConfig {
    pub rpc: RpcConfig,
    pub store: StoreConfig,
}

impl BridgeConfig {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if no config file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!(
                "No config file found at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        log::info!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the config file path based on environment and platform.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("IMGBRIDGE_CONFIG") {
            return PathBuf::from(path);
        }

        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "imgbridge") {
            return proj_dirs.config_dir().join("config.toml");
        }

        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".config/imgbridge/config.toml")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ns = &self.rpc.namespace;
        if ns.is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc.namespace must not be empty".to_string(),
            ));
        }
        if ns.chars().any(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "rpc.namespace must not contain whitespace, got {ns:?}"
            )));
        }
        if ns.starts_with('.') || ns.ends_with('.') {
            return Err(ConfigError::ValidationError(format!(
                "rpc.namespace must not start or end with '.', got {ns:?}"
            )));
        }

        let store = &self.store;
        if store.quota_mib > MAX_QUOTA_MIB {
            return Err(ConfigError::ValidationError(format!(
                "store.quota_mib must be <= {MAX_QUOTA_MIB}, got {}",
                store.quota_mib
            )));
        }
        let image_cap = store.quota_mib.min(MAX_IMAGE_MIB);
        if store.max_image_mib == 0 || store.max_image_mib > image_cap {
            return Err(ConfigError::ValidationError(format!(
                "store.max_image_mib must be between 1 and {image_cap}, got {}",
                store.max_image_mib
            )));
        }

        Ok(())
    }
}

/// Notification channel settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct RpcConfig {
    /// Prefix of every method name, e.g. `neovide` in `neovide.img.show`.
    pub namespace: String,
    /// Host socket; discovered from the runtime dir when unset.
    pub socket: Option<PathBuf>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            namespace: method::DEFAULT_NAMESPACE.to_string(),
            socket: None,
        }
    }
}

/// Host-side image store limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct StoreConfig {
    /// Total size of stored images before the least recently used are evicted.
    pub quota_mib: u32,
    /// Largest single image accepted.
    pub max_image_mib: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            quota_mib: 320,
            max_image_mib: 64,
        }
    }
}

impl StoreConfig {
    pub fn quota_bytes(&self) -> usize {
        self.quota_mib as usize * MIB
    }

    pub fn max_image_bytes(&self) -> usize {
        self.max_image_mib as usize * MIB
    }
}
