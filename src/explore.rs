//! Interactive exploration without the UI.
//!
//! A [`Session`] holds one validated table. Callers ask it for the selectable
//! options, build a [`View`] for the current selection and chart type, and
//! optionally persist or download what they see.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use comfy_table::Table;
use tracing::info;

use crate::config::Config;
use crate::data::columnar::{validate, CleanedTable, CoercionReport};
use crate::data::loader::{example_table, read_csv_bytes, RawTable};
use crate::data::metric::Metric;
use crate::data::shaped::{shape, Selection, ShapedTable, DISPLAY_DECIMALS};
use crate::data::utils::unique_ordered;
use crate::error::{Error, Result};
use crate::pipeline::finish_run;
use crate::plot::chart::{render, ChartArtifact, ChartType};
use crate::plot::paths;
use crate::plot::plot_set::{generate_all, OutputRun};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// An uploaded CSV, kept on disk under the uploads directory
    Upload { stem: String, saved: PathBuf },
    Example,
}

/// Everything a user may pick from.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub algorithms: Vec<String>,
    pub metrics: Vec<Metric>,
    pub chart_types: [ChartType; 3],
}

/// The chart and table for one selection.
#[derive(Debug, Clone)]
pub struct View {
    pub selection: Selection,
    pub chart_type: ChartType,
    pub shaped: ShapedTable,
    pub chart: ChartArtifact,
}

impl View {
    /// The metrics table, rounded for display
    pub fn table(&self) -> Table {
        self.shaped.display_table(DISPLAY_DECIMALS)
    }

    /// The algorithm in focus when exactly one is selected.
    pub fn focused_algorithm(&self) -> Option<&str> {
        match self.selection.algorithms.as_deref() {
            Some([only]) => Some(only.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    source: Source,
    cleaned: CleanedTable,
    report: CoercionReport,
    config: Config,
}

impl Session {
    /// Keep a copy of the upload as `<uploads>/<stem>.csv`, then validate it.
    ///
    /// The copy is written even when validation fails.
    pub fn from_upload(name: &str, bytes: &[u8], config: &Config) -> Result<Self> {
        let stem = paths::input_stem(Path::new(name));
        paths::ensure_dir(&config.output.uploads)?;
        let saved = config.output.uploads.join(format!("{stem}.csv"));
        fs::write(&saved, bytes).map_err(|e| Error::io(&saved, e))?;
        info!(upload = name, saved = %saved.display(), "stored upload");

        let raw = read_csv_bytes(bytes)?;
        Self::with_table(Source::Upload { stem, saved }, &raw, config)
    }

    /// Session over the built-in demo table.
    pub fn example(config: &Config) -> Result<Self> {
        Self::with_table(Source::Example, &example_table()?, config)
    }

    fn with_table(source: Source, raw: &RawTable, config: &Config) -> Result<Self> {
        let (cleaned, report) = validate(raw)?;
        report.log();
        Ok(Session {
            source,
            cleaned,
            report,
            config: config.clone(),
        })
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn report(&self) -> &CoercionReport {
        &self.report
    }

    pub fn cleaned(&self) -> &CleanedTable {
        &self.cleaned
    }

    pub fn options(&self) -> Options {
        Options {
            algorithms: unique_ordered(self.cleaned.algorithms().iter().cloned()),
            metrics: Metric::ALL.to_vec(),
            chart_types: ChartType::ALL,
        }
    }

    pub fn view(&self, selection: &Selection, chart_type: ChartType) -> View {
        let shaped = shape(&self.cleaned, selection);
        let chart = render(&shaped, chart_type);
        View {
            selection: selection.clone(),
            chart_type,
            shaped,
            chart,
        }
    }

    /// Persist the current comparison chart next to a full plot set.
    ///
    /// Only uploads are persisted; the demo table returns `Ok(None)`.
    pub fn save(&self, view: &View) -> Result<Option<OutputRun>> {
        self.save_at(view, &Local::now())
    }

    pub fn save_at<Tz>(&self, view: &View, now: &DateTime<Tz>) -> Result<Option<OutputRun>>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let stem = match &self.source {
            Source::Upload { stem, .. } => stem,
            Source::Example => return Ok(None),
        };
        let stamp = paths::timestamp(now, &self.config.output.timestamp_format);
        let root = paths::run_dir(&self.config.output.root, stem, &stamp);

        let plots = &self.config.plots;
        let mut run = generate_all(&view.shaped, &root, &plots.plot_set_options())?;
        run.save_chart(
            &view.chart,
            PathBuf::from(paths::comparison_file(view.chart_type)),
            &plots.image_policy(),
        )?;
        finish_run(&mut run, &view.shaped, plots)?;
        info!(root = %run.root.display(), "saved organized plots and CSV");
        Ok(Some(run))
    }

    /// CSV export of a selection; `None` when it has no rows or columns.
    pub fn download_csv(&self, selection: &Selection) -> Result<Option<Vec<u8>>> {
        let shaped = shape(&self.cleaned, selection);
        if shaped.is_empty() {
            return Ok(None);
        }
        shaped.to_csv_bytes().map(Some)
    }
}
