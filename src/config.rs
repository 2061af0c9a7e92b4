//! User configuration
//!
//! Defaults for new projects, stored as RON in the platform config directory
//! (`~/.config/smbx-tileset/config.ron` on Linux). A missing file means the
//! built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::project::ExportSettings;

/// Error type for config loading and saving
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Settings used when a tileset has no project file yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid_size: u32,
    pub padding: u32,
    pub pixel_scale: u32,
    pub block_ids: String,
    pub bgo_ids: String,
    pub start_high: bool,
    pub create_pge_tileset: bool,
    /// Export directory; `None` exports next to the tileset image
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let settings = ExportSettings::default();
        Self {
            grid_size: settings.grid_size,
            padding: settings.padding,
            pixel_scale: settings.pixel_scale,
            block_ids: settings.block_ids,
            bgo_ids: settings.bgo_ids,
            start_high: settings.start_high,
            create_pge_tileset: settings.create_pge_tileset,
            output_dir: None,
        }
    }
}

impl Config {
    /// Location of the per-user config file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("smbx-tileset")
            .join("config.ron")
    }

    /// Load from `path`, falling back to defaults when the file doesn't exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        ron::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write to `path`, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .indentor("  ".to_string());
        let text = ron::ser::to_string_pretty(self, pretty)?;
        fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Project settings seeded from this config
    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            grid_size: self.grid_size,
            padding: self.padding,
            pixel_scale: self.pixel_scale,
            block_ids: self.block_ids.clone(),
            bgo_ids: self.bgo_ids.clone(),
            start_high: self.start_high,
            create_pge_tileset: self.create_pge_tileset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = setup_test_dir();
        let config = Config::load(&temp.path().join("config.ron")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.export_settings(), ExportSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp = setup_test_dir();
        let path = temp.path().join("nested").join("config.ron");
        let config = Config {
            grid_size: 32,
            bgo_ids: "User Slots".to_string(),
            start_high: true,
            output_dir: Some(PathBuf::from("export")),
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp = setup_test_dir();
        let path = temp.path().join("config.ron");
        fs::write(&path, "(pixel_scale: 1, block_ids: \"1-500\")").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.pixel_scale, 1);
        assert_eq!(config.block_ids, "1-500");
        assert_eq!(config.grid_size, 16);
        assert!(config.create_pge_tileset);
    }

    #[test]
    fn test_malformed_file() {
        let temp = setup_test_dir();
        let path = temp.path().join("config.ron");
        fs::write(&path, "(grid_size: \"big\")").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }
}
