use std::fs;
use std::io::Cursor;
use std::path::Path;

use polars::prelude::{CsvReader, DataFrame, NamedFrom, SerReader, Series};
use tracing::debug;

use crate::error::{Error, Result};

/// A decoded table exactly as it arrived: arbitrary columns, no invariants.
pub type RawTable = DataFrame;

/// Decode delimited text with a header row.
///
/// The reader drops leading whitespace from unquoted cells; trailing
/// whitespace is kept. Every column is read as text so that score coercion happens in one place
/// (the validator) instead of being split with polars' type inference.
pub fn read_csv_bytes(bytes: &[u8]) -> Result<RawTable> {
    let df = CsvReader::new(Cursor::new(bytes))
        .has_header(true)
        .infer_schema(Some(0))
        .finish()?;
    debug!(rows = df.height(), columns = df.width(), "decoded metrics table");
    Ok(df)
}

/// Load a metrics CSV from disk
pub fn read_csv_path(path: &Path) -> Result<RawTable> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    read_csv_bytes(&bytes)
}

/// Built-in demo table shown when nothing has been uploaded.
pub fn example_table() -> Result<RawTable> {
    let df = DataFrame::new(vec![
        Series::new("algorithm", &["Logistic Regression", "Random Forest", "GCN"]),
        Series::new("accuracy", &[0.78, 0.86, 0.82]),
        Series::new("precision", &[0.60, 0.81, 0.75]),
        Series::new("recall", &[0.55, 0.79, 0.72]),
        Series::new("f1_score", &[0.57, 0.80, 0.73]),
    ])?;
    Ok(df)
}
