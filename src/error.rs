use std::path::{Path, PathBuf};

use polars::prelude::PolarsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the metrics pipeline.
///
/// Unparseable or out-of-range scores and empty selections are not errors;
/// see [`crate::data::columnar::CoercionReport`].
#[derive(Debug, Error)]
pub enum Error {
    /// Required columns are missing after case-insensitive matching.
    #[error("CSV must contain columns: algorithm, accuracy, precision, recall, f1_score")]
    Schema,

    #[error("unknown metric '{0}' (expected one of: accuracy, precision, recall, f1_score)")]
    UnknownMetric(String),

    #[error("unknown chart type '{0}' (expected 'bar', 'horizontal-bar' or 'line')")]
    UnknownChartType(String),

    #[error("table operation failed: {0}")]
    Table(#[from] PolarsError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("chart rendering failed: {0}")]
    Render(String),

    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to serialize manifest: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn render(err: impl std::fmt::Display) -> Self {
        Error::Render(err.to_string())
    }
}
