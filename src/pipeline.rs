//! Batch entry: one CSV in, one timestamped run directory out.

use std::fmt::Display;
use std::path::Path;

use chrono::{DateTime, Local, TimeZone};
use tracing::info;

use crate::config::{Config, PlotsConfig};
use crate::data::columnar::validate;
use crate::data::loader::read_csv_path;
use crate::data::shaped::{shape, Selection, ShapedTable};
use crate::error::Result;
use crate::plot::paths::{self, SELECTED_CSV_FILE};
use crate::plot::plot_set::{generate_all, OutputRun};

/// Read, validate and shape `csv_path`, then write the full plot set under
/// `<output.root>/<stem>/<timestamp>/`.
///
/// A schema error returns before any directory is created.
pub fn generate(csv_path: &Path, selection: &Selection, config: &Config) -> Result<OutputRun> {
    generate_at(csv_path, selection, config, &Local::now())
}

pub fn generate_at<Tz>(
    csv_path: &Path,
    selection: &Selection,
    config: &Config,
    now: &DateTime<Tz>,
) -> Result<OutputRun>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let raw = read_csv_path(csv_path)?;
    let (cleaned, report) = validate(&raw)?;
    report.log();
    let shaped = shape(&cleaned, selection);

    let stamp = paths::timestamp(now, &config.output.timestamp_format);
    let root = paths::run_dir(&config.output.root, &paths::input_stem(csv_path), &stamp);
    info!(input = %csv_path.display(), root = %root.display(), "generating plots");

    export_run(&shaped, &root, &config.plots)
}

/// Plot set, then `selected_metrics.csv`, then the manifest.
pub fn export_run(shaped: &ShapedTable, root: &Path, plots: &PlotsConfig) -> Result<OutputRun> {
    let mut run = generate_all(shaped, root, &plots.plot_set_options())?;
    finish_run(&mut run, shaped, plots)?;
    Ok(run)
}

/// Write the CSV export and, if enabled, the manifest. Must come last.
pub fn finish_run(run: &mut OutputRun, shaped: &ShapedTable, plots: &PlotsConfig) -> Result<()> {
    shaped.write_csv(&run.path(SELECTED_CSV_FILE))?;
    run.record(SELECTED_CSV_FILE);
    if plots.write_manifest {
        run.write_manifest()?;
    }
    info!(root = %run.root.display(), files = run.files.len(), "run complete");
    Ok(())
}
