//! Application configuration: chart geometry and table page sizes, loaded
//! from a TOML file in the user config directory when one exists.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);
        Ok(Self { config_dir })
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }
}

/// Chart rendering settings. Defaults render at 1200x800.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub histogram_bins: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            histogram_bins: 30,
        }
    }
}

/// Table view settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TableConfig {
    /// Rows shown in the upload-time preview.
    pub preview_rows: usize,
    /// Default page size for paginated table views.
    pub page_rows: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            preview_rows: 10,
            page_rows: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub chart: ChartConfig,
    pub table: TableConfig,
}

impl AppConfig {
    /// Parse a config file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Load from the user config directory, falling back to defaults when no
    /// file exists.
    pub fn load(manager: &ConfigManager) -> Result<Self> {
        let path = manager.config_path();
        if path.exists() {
            Self::from_path(&path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_chart_geometry() {
        let config = AppConfig::default();
        assert_eq!(config.chart.width, 1200);
        assert_eq!(config.chart.height, 800);
        assert_eq!(config.chart.histogram_bins, 30);
        assert_eq!(config.table.preview_rows, 10);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(file, "[chart]\nwidth = 640\nheight = 480").expect("write");

        let config = AppConfig::from_path(&path).expect("parse");
        assert_eq!(config.chart.width, 640);
        assert_eq!(config.chart.height, 480);
        assert_eq!(config.chart.histogram_bins, 30);
        assert_eq!(config.table, TableConfig::default());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let manager = ConfigManager::with_dir(dir.path().join("nope"));
        let config = AppConfig::load(&manager).expect("load");
        assert_eq!(config, AppConfig::default());
    }
}
