//! Where a run's files go and what they are called.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::data::metric::Metric;
use crate::error::{Error, Result};
use crate::plot::chart::ChartType;

pub const COMPARISONS_DIR: &str = "comparisons";
pub const PER_METRIC_DIR: &str = "per_metric";
pub const PER_ALGORITHM_DIR: &str = "per_algorithm";
pub const ALGORITHM_CHART_FILE: &str = "metrics_line.png";
pub const SELECTED_CSV_FILE: &str = "selected_metrics.csv";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Turn an algorithm name into a single safe path segment.
///
/// Characters other than alphanumerics, `-`, `_` and space become `_`; the
/// result is trimmed and its spaces become `_`. Distinct names may collide.
pub fn sanitize(name: &str) -> String {
    let mapped: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let segment = mapped.trim().replace(' ', "_");
    if segment.is_empty() {
        // a blank name would otherwise land in per_algorithm/ itself
        return "_".to_string();
    }
    segment
}

pub fn timestamp<Tz>(now: &DateTime<Tz>, format: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    now.format(format).to_string()
}

/// File stem of the input, `input` if the path has none.
pub fn input_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "input".to_string())
}

/// `<out_root>/<stem>/<timestamp>`
pub fn run_dir(out_root: &Path, stem: &str, timestamp: &str) -> PathBuf {
    out_root.join(stem).join(timestamp)
}

pub fn comparison_file(chart_type: ChartType) -> String {
    format!("comparison_{}.png", chart_type.slug())
}

pub fn metric_file(metric: Metric) -> String {
    format!("{}_bar.png", metric.as_str())
}

/// Run-relative path of one comparison chart.
pub fn comparison_path(chart_type: ChartType) -> PathBuf {
    Path::new(COMPARISONS_DIR).join(comparison_file(chart_type))
}

pub fn metric_path(metric: Metric) -> PathBuf {
    Path::new(PER_METRIC_DIR).join(metric_file(metric))
}

pub fn algorithm_path(name: &str) -> PathBuf {
    Path::new(PER_ALGORITHM_DIR)
        .join(sanitize(name))
        .join(ALGORITHM_CHART_FILE)
}

/// Create `path` and its parents; existing directories are fine.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}
