use std::fs::File;
use std::path::Path;

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use itertools::Itertools;
use polars::prelude::{CsvWriter, DataFrame, NamedFrom, SerWriter, Series};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::columnar::{CleanedTable, ALGORITHM_COLUMN};
use crate::data::metric::Metric;
use crate::data::utils::{format_score, unique_ordered};
use crate::error::{Error, Result};

/// Decimal places used when a shaped table is shown rather than exported.
pub const DISPLAY_DECIMALS: usize = 4;

/// Which algorithms and metrics to keep. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub algorithms: Option<Vec<String>>,
    pub metrics: Option<Vec<Metric>>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_algorithms<S: Into<String>>(mut self, algorithms: impl IntoIterator<Item = S>) -> Self {
        self.algorithms = Some(algorithms.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_metrics(mut self, metrics: impl IntoIterator<Item = Metric>) -> Self {
        self.metrics = Some(metrics.into_iter().collect());
        self
    }
}

/// A cleaned table reduced to a selection and keyed by algorithm name.
///
/// `values[row][col]` is the score of `algorithms[row]` for `metrics[col]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedTable {
    algorithms: Vec<String>,
    metrics: Vec<Metric>,
    values: Vec<Vec<f64>>,
}

/// Filter rows by algorithm and columns by metric.
///
/// Rows stay in the cleaned table's order (duplicates included); metrics
/// follow the requested order. Empty selections give an empty table.
pub fn shape(cleaned: &CleanedTable, selection: &Selection) -> ShapedTable {
    let wanted_algorithms: Vec<String> = match &selection.algorithms {
        Some(list) => list.clone(),
        None => unique_ordered(cleaned.algorithms().iter().cloned()),
    };
    let metrics: Vec<Metric> = match &selection.metrics {
        Some(list) => unique_ordered(list.iter().copied()),
        None => Metric::ALL.to_vec(),
    };

    let mut algorithms = Vec::new();
    let mut values = Vec::new();
    for (idx, name) in cleaned.algorithms().iter().enumerate() {
        if !wanted_algorithms.contains(name) {
            continue;
        }
        algorithms.push(name.clone());
        values.push(metrics.iter().map(|m| cleaned.column_f64(*m)[idx]).collect());
    }

    debug!(rows = algorithms.len(), columns = metrics.len(), "shaped metrics table");
    ShapedTable { algorithms, metrics, values }
}

impl ShapedTable {
    pub fn algorithms(&self) -> &[String] {
        &self.algorithms
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn n_rows(&self) -> usize {
        self.algorithms.len()
    }

    pub fn n_cols(&self) -> usize {
        self.metrics.len()
    }

    /// No rows or no columns: nothing to plot.
    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty() || self.metrics.is_empty()
    }

    /// Scores of one row in column order
    pub fn row(&self, idx: usize) -> &[f64] {
        &self.values[idx]
    }

    /// Scores of one metric in row order, `None` if the metric is not selected
    pub fn column(&self, metric: Metric) -> Option<Vec<f64>> {
        let col = self.metrics.iter().position(|m| *m == metric)?;
        Some(self.values.iter().map(|row| row[col]).collect())
    }

    pub fn value(&self, row: usize, metric: Metric) -> Option<f64> {
        let col = self.metrics.iter().position(|m| *m == metric)?;
        self.values.get(row).map(|r| r[col])
    }

    /// `(algorithm, score)` pairs for one metric, best first.
    ///
    /// Ties keep their row order.
    pub fn ranking(&self, metric: Metric) -> Vec<(String, f64)> {
        match self.column(metric) {
            Some(scores) => self
                .algorithms
                .iter()
                .cloned()
                .zip(scores)
                .sorted_by(|a, b| b.1.total_cmp(&a.1))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Polars frame with `algorithm` as the leading column.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![Series::new(ALGORITHM_COLUMN, self.algorithms.as_slice())];
        for (col, metric) in self.metrics.iter().enumerate() {
            let scores: Vec<f64> = self.values.iter().map(|row| row[col]).collect();
            columns.push(Series::new(metric.as_str(), scores));
        }
        Ok(DataFrame::new(columns)?)
    }

    /// Full-precision CSV export (`algorithm,<metrics...>`).
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut df = self.to_dataframe()?;
        let mut buf = Vec::new();
        CsvWriter::new(&mut buf).has_header(true).finish(&mut df)?;
        Ok(buf)
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut df = self.to_dataframe()?;
        let mut file = File::create(path).map_err(|e| Error::io(path, e))?;
        CsvWriter::new(&mut file).has_header(true).finish(&mut df)?;
        debug!(path = %path.display(), rows = df.height(), "wrote selected metrics");
        Ok(())
    }

    /// On-screen table, scores rounded to `decimals` places.
    pub fn display_table(&self, decimals: usize) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);

        let mut header = vec![Cell::new(ALGORITHM_COLUMN)];
        header.extend(self.metrics.iter().map(|m| Cell::new(m.as_str())));
        table.set_header(header);

        for (name, row) in self.algorithms.iter().zip(&self.values) {
            let mut cells = vec![Cell::new(name)];
            cells.extend(
                row.iter()
                    .map(|v| Cell::new(format_score(*v, decimals)).set_alignment(CellAlignment::Right)),
            );
            table.add_row(cells);
        }
        table
    }
}
