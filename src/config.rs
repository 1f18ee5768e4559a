//! Configuration file support for weblog-stats.
//!
//! Loads settings from `~/.config/weblog-stats/config.toml` on Linux
//! (or platform-appropriate location on other OSes).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::parser::HourSource;
use crate::report::{OutputFormat, ReportOptions};
use crate::stats::HourOrder;

/// Log file analyzed when none is given on the command line.
pub const DEFAULT_LOG_FILE: &str = "access.log";

/// Application configuration loaded from TOML file.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log file to analyze.
    pub log_file: PathBuf,

    /// Order of the hourly trend listing.
    pub hour_order: HourOrder,

    /// How the hour bucket is taken from each timestamp.
    pub hour_source: HourSource,

    /// Maximum number of pages to list (all when unset).
    pub top_pages: Option<usize>,

    /// Report output format.
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            hour_order: HourOrder::default(),
            hour_source: HourSource::default(),
            top_pages: None,
            format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default config file location.
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but is malformed.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in config file: {}", path.display()))
    }

    /// Returns the path to the config file.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("weblog-stats/config.toml"))
    }

    /// Validate all configuration settings.
    pub fn validate(&self) -> Result<()> {
        if self.top_pages == Some(0) {
            anyhow::bail!("top_pages must be at least 1");
        }
        Ok(())
    }

    /// Reporting options derived from this configuration.
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            hour_order: self.hour_order,
            top_pages: self.top_pages,
        }
    }
}
