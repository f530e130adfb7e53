//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\chorale\config.toml
//! - macOS: ~/Library/Application Support/chorale/config.toml
//! - Linux: ~/.config/chorale/config.toml
//!
//! The config file is human-readable and editable. Settings are loaded
//! at startup; absent fields fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API credentials (keep separate for potential future encryption)
    pub credentials: Credentials,

    /// Library settings
    pub library: LibraryConfig,

    /// Storage locations
    pub storage: StorageConfig,
}

/// API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Last.fm API key for online artwork lookups
    pub lastfm_api_key: Option<String>,
}

/// Library indexing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Do not re-add files that were previously removed from the library
    pub skip_removed_files_during_refresh: bool,

    /// Look up missing album covers online
    pub download_missing_album_covers: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            skip_removed_files_during_refresh: true,
            download_missing_album_covers: false,
        }
    }
}

/// Storage locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path (default: <data dir>/chorale/chorale.db)
    pub database_path: Option<PathBuf>,

    /// Artwork cache directory (default: <cache dir>/chorale/CoverArt)
    pub artwork_cache_dir: Option<PathBuf>,
}

impl Config {
    /// Resolved database path, honoring the configured override.
    pub fn database_path(&self) -> PathBuf {
        self.storage.database_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("chorale")
                .join("chorale.db")
        })
    }
}

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("chorale"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}
