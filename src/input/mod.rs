use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;

pub mod source;

use source::{delimiter_for, open_maybe_gz};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("required column not found: {0}")]
    MissingColumn(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Untyped header + cells exactly as read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Typed view of the input. Rows stay in file order; `text` keeps the raw
/// cells so non-metric columns pass through to the output untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTable {
    pub columns: Vec<String>,
    pub text: Vec<Vec<String>>,
    pub entity: Vec<String>,
    pub dates: Vec<Option<NaiveDate>>,
    pub metric_names: Vec<String>,
    pub metric_columns: Vec<usize>,
    pub metrics: Vec<Vec<f64>>,
}

impl ObservationTable {
    pub fn n_rows(&self) -> usize {
        self.entity.len()
    }

    pub fn n_metrics(&self) -> usize {
        self.metric_names.len()
    }

    /// Metric index for a column position, if that column is a metric.
    pub fn metric_at_column(&self, column: usize) -> Option<usize> {
        self.metric_columns.iter().position(|&c| c == column)
    }
}

pub fn load_raw_table(path: &Path) -> Result<RawTable, InputError> {
    let reader = open_maybe_gz(path)?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_for(path))
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(InputError::InvalidInput(format!(
            "{} has no header row",
            path.display()
        )));
    }

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    tracing::info!(
        path = %path.display(),
        columns = headers.len(),
        rows = rows.len(),
        "loaded input table"
    );

    Ok(RawTable { headers, rows })
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/table.rs"]
mod tests;
