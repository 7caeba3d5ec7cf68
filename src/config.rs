//! Configuration file support
//!
//! Settings are read from `./strikeout.toml` first, then from
//! `<config dir>/strikeout-pdf/config.toml`. Command-line flags override
//! whatever the file says.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::rasterize::DEFAULT_DPI;
use crate::strike::{HsvRange, StrikeOptions, DEFAULT_MARGIN_X, DEFAULT_MARGIN_Y};

/// Local config file name
pub const LOCAL_CONFIG_FILE: &str = "strikeout.toml";

/// Config error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found")]
    NotFound,

    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// File-backed settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Render resolution
    pub dpi: u32,
    /// Horizontal erase margin
    pub margin_x: u32,
    /// Vertical erase margin
    pub margin_y: u32,
    /// Fill color as RGB
    pub fill: [u8; 3],
    /// Worker threads for page processing
    pub threads: Option<usize>,
    /// HSV bands treated as marks
    pub ranges: Vec<HsvRange>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            margin_x: DEFAULT_MARGIN_X,
            margin_y: DEFAULT_MARGIN_Y,
            fill: [255, 255, 255],
            threads: None,
            ranges: HsvRange::red(),
        }
    }
}

/// Values set explicitly on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dpi: Option<u32>,
    pub margin_x: Option<u32>,
    pub margin_y: Option<u32>,
    pub threads: Option<usize>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Config {
    /// Load from the first config file found
    pub fn load() -> Result<Self, ConfigError> {
        Self::search_paths()
            .into_iter()
            .find(|p| p.is_file())
            .ok_or(ConfigError::NotFound)
            .and_then(|p| Self::load_from_path(&p))
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Candidate config locations, most specific first
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("strikeout-pdf").join("config.toml"));
        }
        paths
    }

    /// Apply command-line overrides (CLI wins)
    pub fn merge_with_cli(mut self, cli: &CliOverrides) -> Self {
        if let Some(dpi) = cli.dpi {
            self.dpi = dpi;
        }
        if let Some(mx) = cli.margin_x {
            self.margin_x = mx;
        }
        if let Some(my) = cli.margin_y {
            self.margin_y = my;
        }
        if cli.threads.is_some() {
            self.threads = cli.threads;
        }
        self
    }

    pub fn to_options(&self) -> StrikeOptions {
        StrikeOptions::builder()
            .ranges(self.ranges.clone())
            .margin_x(self.margin_x)
            .margin_y(self.margin_y)
            .fill(self.fill)
            .build()
    }
}
