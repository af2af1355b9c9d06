//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Datelike;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use replay_core::{BucketRange, YearMonth};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory of the document store.
    pub data_dir: PathBuf,

    /// First month of the dataset, `"M/YYYY"`.
    pub range_start: String,

    /// Last month of the dataset, `"M/YYYY"`.
    pub range_end: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("data_dir", &self.data_dir)
            .field("range_start", &self.range_start)
            .field("range_end", &self.range_end)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let this_year = chrono::Local::now().year();
        Self {
            data_dir,
            range_start: "1/2015".to_string(),
            range_end: format!("12/{this_year}"),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (REPLAY_*)
        figment = figment.merge(Env::prefixed("REPLAY_"));

        figment.extract()
    }

    /// The configured bucket range.
    pub fn bucket_range(&self) -> Result<BucketRange> {
        let start: YearMonth = self
            .range_start
            .parse()
            .with_context(|| format!("invalid range_start: {}", self.range_start))?;
        let end: YearMonth = self
            .range_end
            .parse()
            .with_context(|| format!("invalid range_end: {}", self.range_end))?;
        BucketRange::new(start, end).context("invalid bucket range")
    }
}

/// Returns the platform-specific config directory for replay.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("replay"))
}

/// Returns the platform-specific data directory for replay.
///
/// On Linux: `~/.local/share/replay`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("replay"))
}
