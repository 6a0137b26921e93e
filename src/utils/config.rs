//! Application configuration

use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Where converted files are written
    pub output_dir: PathBuf,

    /// Descend into sub-folders when a folder is added
    pub recursive_scan: bool,

    /// Capacity of the backend command channel
    pub command_buffer: usize,

    /// Default `tracing` filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            output_dir: dirs::video_dir()
                .map(|dir| dir.join("Forge"))
                .unwrap_or_else(|| PathBuf::from("./converted")),
            recursive_scan: true,
            command_buffer: 100,
            log_filter: "info".to_string(),
        }
    }
}

impl AppSettings {
    /// `<config dir>/forge/settings.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("forge")
            .join("settings.json")
    }

    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let mut settings: AppSettings = serde_json::from_str(&content)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Like [`load`](Self::load), but falls back to defaults on a bad file
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings from {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Enforce sane minimums
    fn sanitize(&mut self) {
        if self.command_buffer == 0 {
            self.command_buffer = 1;
        }
        if self.log_filter.trim().is_empty() {
            self.log_filter = "info".to_string();
        }
    }
}
