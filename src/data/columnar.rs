use std::collections::HashMap;

use polars::prelude::{DataFrame, DataType, NamedFrom, Series};
use serde::Serialize;
use tracing::{debug, warn};

use crate::data::loader::RawTable;
use crate::data::metric::Metric;
use crate::error::{Error, Result};

pub const ALGORITHM_COLUMN: &str = "algorithm";

/// Text used for a missing algorithm cell, matching how a null is stringified.
const MISSING_ALGORITHM: &str = "nan";

/// Validated metrics table.
///
/// Holds `algorithm` plus the four metric columns in canonical order; every
/// score is in [0, 1]. Rows keep their input order and duplicate algorithm
/// names are kept as separate rows.
#[derive(Clone, Debug, PartialEq)]
pub struct CleanedTable {
    algorithms: Vec<String>,
    data: HashMap<Metric, Vec<f64>>,
}

impl CleanedTable {
    /// Algorithm names, one per row
    pub fn algorithms(&self) -> &[String] {
        &self.algorithms
    }

    /// Scores of one metric column, or an empty slice if absent
    pub fn column_f64(&self, metric: Metric) -> &[f64] {
        self.data.get(&metric).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Scores of row `idx` in canonical metric order
    pub fn row(&self, idx: usize) -> Vec<f64> {
        Metric::ALL
            .iter()
            .map(|m| self.column_f64(*m)[idx])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }

    /// Back to a polars frame with the canonical column layout.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![Series::new(ALGORITHM_COLUMN, self.algorithms.as_slice())];
        for metric in Metric::ALL {
            columns.push(Series::new(metric.as_str(), self.column_f64(metric)));
        }
        Ok(DataFrame::new(columns)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Missing, NaN or non-numeric; replaced by 0.0.
    Zeroed,
    /// Numeric but outside [0, 1]; clamped to the nearest bound.
    Clamped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoercionAnomaly {
    pub row: usize,
    pub metric: Metric,
    pub kind: AnomalyKind,
    pub raw: String,
}

/// Side report of the lenient score coercion. Never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoercionReport {
    pub zeroed: usize,
    pub clamped: usize,
    pub anomalies: Vec<CoercionAnomaly>,
}

impl CoercionReport {
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }

    fn record(&mut self, row: usize, metric: Metric, kind: AnomalyKind, raw: String) {
        match kind {
            AnomalyKind::Zeroed => self.zeroed += 1,
            AnomalyKind::Clamped => self.clamped += 1,
        }
        self.anomalies.push(CoercionAnomaly { row, metric, kind, raw });
    }

    /// Emit one warning per anomaly
    pub fn log(&self) {
        for a in &self.anomalies {
            warn!(row = a.row, metric = %a.metric, raw = %a.raw, kind = ?a.kind, "coerced score cell");
        }
        if !self.is_clean() {
            warn!(zeroed = self.zeroed, clamped = self.clamped, "score coercion applied");
        }
    }
}

/// Score coercion policy: missing and NaN become 0.0, everything else is
/// clamped into [0, 1].
pub fn clamp_score(value: Option<f64>) -> f64 {
    match value {
        Some(v) if !v.is_nan() => v.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Parse one score cell; `None` when the text is not a number.
pub fn parse_score(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

/// Check required columns (case-insensitively) and coerce the table.
///
/// Extra columns are dropped, the required ones are renamed to lower case and
/// put in canonical order. The only failure is [`Error::Schema`]; a table
/// with zero rows is valid.
pub fn validate(raw: &RawTable) -> Result<(CleanedTable, CoercionReport)> {
    // later duplicates win, like a dict built from the header
    let cols_lower: HashMap<String, &str> = raw
        .get_column_names()
        .into_iter()
        .map(|c| (c.to_lowercase(), c))
        .collect();

    let required = std::iter::once(ALGORITHM_COLUMN).chain(Metric::ALL.into_iter().map(|m| m.as_str()));
    let missing: Vec<&str> = required.filter(|c| !cols_lower.contains_key(*c)).collect();
    if !missing.is_empty() {
        debug!(?missing, "metrics table rejected");
        return Err(Error::Schema);
    }

    let algorithms = text_column(raw.column(cols_lower[ALGORITHM_COLUMN])?)?
        .into_iter()
        .map(|v| v.unwrap_or_else(|| MISSING_ALGORITHM.to_string()))
        .collect();

    let mut report = CoercionReport::default();
    let mut data = HashMap::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        let series = raw.column(cols_lower[metric.as_str()])?;
        let values = coerce_scores(series, metric, &mut report)?;
        data.insert(metric, values);
    }

    let cleaned = CleanedTable { algorithms, data };
    debug!(rows = cleaned.len(), zeroed = report.zeroed, clamped = report.clamped, "metrics table validated");
    Ok((cleaned, report))
}

fn text_column(series: &Series) -> Result<Vec<Option<String>>> {
    let text = series.cast(&DataType::Utf8)?;
    Ok(text
        .utf8()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

fn coerce_scores(series: &Series, metric: Metric, report: &mut CoercionReport) -> Result<Vec<f64>> {
    let mut out = Vec::with_capacity(series.len());

    if matches!(series.dtype(), DataType::Utf8) {
        for (row, cell) in series.utf8()?.into_iter().enumerate() {
            let parsed = cell.and_then(parse_score);
            out.push(coerce_cell(row, metric, parsed, || cell.unwrap_or("").to_string(), report));
        }
    } else {
        // numeric (or bool) frames built in memory; failed casts come back as null
        let numbers = series.cast(&DataType::Float64)?;
        for (row, cell) in numbers.f64()?.into_iter().enumerate() {
            out.push(coerce_cell(
                row,
                metric,
                cell,
                || cell.map(|v| v.to_string()).unwrap_or_default(),
                report,
            ));
        }
    }

    Ok(out)
}

fn coerce_cell(
    row: usize,
    metric: Metric,
    parsed: Option<f64>,
    raw: impl FnOnce() -> String,
    report: &mut CoercionReport,
) -> f64 {
    let value = clamp_score(parsed);
    match parsed {
        Some(v) if !v.is_nan() && v == value => {}
        Some(v) if !v.is_nan() => report.record(row, metric, AnomalyKind::Clamped, raw()),
        _ => report.record(row, metric, AnomalyKind::Zeroed, raw()),
    }
    value
}
