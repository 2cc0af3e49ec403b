//! Configuration structures for the trade calendar system.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Trade CSV source configuration.
    pub source: SourceConfig,
}

impl Config {
    /// Parse a configuration from JSON text. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

/// Where trade CSV files are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory that every CSV path must stay inside.
    /// Relative roots are resolved against the working directory.
    pub project_root: PathBuf,
    /// CSV used when no explicit path is configured, relative to the root.
    pub default_csv_path: PathBuf,
    /// Explicit CSV path (absolute, or relative to the root).
    pub csv_path: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            default_csv_path: ["docs", "dummy_kabucom.csv"].iter().collect(),
            csv_path: None,
        }
    }
}

impl SourceConfig {
    /// Create a source configuration rooted at the given directory.
    pub fn with_root(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    /// Set the explicit CSV path.
    pub fn csv_path(mut self, csv_path: impl Into<String>) -> Self {
        self.csv_path = Some(csv_path.into());
        self
    }
}
