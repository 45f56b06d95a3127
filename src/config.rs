//! Runtime configuration.
//!
//! Every field has a default, so an absent or empty TOML file is valid.
//! Command-line flags override whatever the file sets.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::plot::export::{ImagePolicy, DEFAULT_DPI};
use crate::plot::paths::TIMESTAMP_FORMAT;
use crate::plot::plot_set::PlotSetOptions;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub plots: PlotsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where runs and uploads are written.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Parent of every `<stem>/<timestamp>` run directory
    #[serde(default = "default_output_root")]
    pub root: PathBuf,

    /// Copies of uploaded CSVs
    #[serde(default = "default_uploads")]
    pub uploads: PathBuf,

    /// strftime pattern for run directory names
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_output_root(),
            uploads: default_uploads(),
            timestamp_format: default_timestamp_format(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlotsConfig {
    #[serde(default = "default_true")]
    pub save_comparisons: bool,

    #[serde(default = "default_true")]
    pub save_per_metric: bool,

    #[serde(default = "default_true")]
    pub save_per_algorithm: bool,

    /// Write `manifest.json` once a run is complete
    #[serde(default = "default_true")]
    pub write_manifest: bool,

    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Crop saved images to their content
    #[serde(default = "default_true")]
    pub tight: bool,
}

impl Default for PlotsConfig {
    fn default() -> Self {
        Self {
            save_comparisons: true,
            save_per_metric: true,
            save_per_algorithm: true,
            write_manifest: true,
            dpi: default_dpi(),
            tight: true,
        }
    }
}

impl PlotsConfig {
    pub fn image_policy(&self) -> ImagePolicy {
        ImagePolicy {
            dpi: self.dpi,
            tight: self.tight,
        }
    }

    pub fn plot_set_options(&self) -> PlotSetOptions {
        PlotSetOptions {
            save_comparisons: self.save_comparisons,
            save_per_metric: self.save_per_metric,
            save_per_algorithm: self.save_per_algorithm,
            image: self.image_policy(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive; `RUST_LOG` wins when set
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default = "default_true")]
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            timestamps: true,
        }
    }
}

fn default_output_root() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_uploads() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_timestamp_format() -> String {
    TIMESTAMP_FORMAT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_dpi() -> u32 {
    DEFAULT_DPI
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
