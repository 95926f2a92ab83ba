//! Configuration manager for loading and saving launcher configuration
//!
//! The configuration lives in `config.json` next to the launcher, i.e. in the
//! directory the manager is bound to. Writes are atomic so a crash never
//! leaves a truncated file behind.

use crate::config::models::LauncherConfig;
use crate::error::{Result, TileIconError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// File name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Configuration manager bound to the launcher's base directory
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base_dir: PathBuf,
}

impl ConfigManager {
    /// Manager for `<base_dir>/config.json`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Manager bound to the directory of the running executable
    ///
    /// Falls back to the current directory when the executable path is unknown.
    pub fn beside_executable() -> Self {
        let base = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(base)
    }

    /// Directory the manager is bound to
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the path to the configuration file
    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE_NAME)
    }

    /// Load configuration from disk
    ///
    /// A missing file is created with the defaults. A corrupt file is logged
    /// and replaced by defaults in memory only, so the user can still fix it.
    pub fn load(&self) -> Result<LauncherConfig> {
        let config_path = self.config_path();

        if !config_path.exists() {
            info!("Configuration file not found, writing defaults to {:?}", config_path);
            let config = LauncherConfig::default();
            if let Err(e) = self.save(&config) {
                warn!("Failed to write default configuration: {}", e);
            }
            return Ok(config);
        }

        let json = std::fs::read_to_string(&config_path)?;

        match serde_json::from_str(&json) {
            Ok(config) => {
                info!("Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                warn!("Failed to parse configuration, using defaults: {}", e);
                Ok(LauncherConfig::default())
            }
        }
    }

    /// Save configuration to disk with atomic write
    ///
    /// Writes a temporary file in the same directory, then persists it over
    /// `config.json`.
    pub fn save(&self, config: &LauncherConfig) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)?;

        let json = serde_json::to_string_pretty(config)?;
        let mut temp = NamedTempFile::new_in(&self.base_dir)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(self.config_path())
            .map_err(|e| TileIconError::ConfigError(Box::new(e)))?;

        info!("Configuration saved successfully");
        Ok(())
    }
}
