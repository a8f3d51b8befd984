use chrono::NaiveDate;

use crate::input::{InputError, ObservationTable, RawTable};

#[derive(Debug, Clone)]
pub struct Stage1Params<'a> {
    pub entity_column: &'a str,
    pub date_column: &'a str,
    pub date_format: &'a str,
}

/// Types the raw table: entity ids, parsed dates, and every all-numeric
/// column as a metric with missing cells imputed by the column mean.
pub fn run_stage1(raw: RawTable, params: &Stage1Params<'_>) -> Result<ObservationTable, InputError> {
    let entity_idx = raw
        .column_index(params.entity_column)
        .ok_or_else(|| InputError::MissingColumn(params.entity_column.to_string()))?;
    let date_idx = raw.column_index(params.date_column);
    if date_idx.is_none() {
        tracing::warn!(
            column = params.date_column,
            "date column not found; rows keep file order within each entity"
        );
    }

    let entity: Vec<String> = raw
        .rows
        .iter()
        .map(|r| r.get(entity_idx).map(|s| s.trim().to_string()).unwrap_or_default())
        .collect();

    let dates: Vec<Option<NaiveDate>> = match date_idx {
        Some(idx) => raw
            .rows
            .iter()
            .map(|r| r.get(idx).and_then(|s| parse_date(s, params.date_format)))
            .collect(),
        None => vec![None; raw.n_rows()],
    };
    let unparsed = dates.iter().filter(|d| d.is_none()).count();
    if date_idx.is_some() && unparsed > 0 {
        tracing::warn!(rows = unparsed, "unparseable dates treated as missing");
    }

    let mut metric_names = Vec::new();
    let mut metric_columns = Vec::new();
    let mut metrics = Vec::new();
    for (col, name) in raw.headers.iter().enumerate() {
        if col == entity_idx || Some(col) == date_idx {
            continue;
        }
        let coerced = coerce_numeric(&raw.rows, col);
        if !coerced.is_metric() {
            if coerced.parsed > 0 {
                tracing::warn!(
                    column = %name,
                    parsed = coerced.parsed,
                    rejected = coerced.rejected,
                    "mostly non-numeric column excluded from metrics"
                );
            }
            continue;
        }
        if coerced.rejected > 0 {
            tracing::warn!(
                column = %name,
                cells = coerced.rejected,
                "non-numeric cells treated as missing"
            );
        }
        metric_names.push(name.clone());
        metric_columns.push(col);
        metrics.push(impute_mean(coerced.values));
    }

    tracing::info!(
        rows = raw.n_rows(),
        metrics = metric_names.len(),
        "prepared observation table"
    );

    Ok(ObservationTable {
        columns: raw.headers,
        text: raw.rows,
        entity,
        dates,
        metric_names,
        metric_columns,
        metrics,
    })
}

pub fn parse_date(raw: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), format).ok()
}

/// Cell spellings read as missing rather than as text.
const MISSING_TOKENS: &[&str] = &[
    "-", "na", "n/a", "#n/a", "#na", "<na>", "nan", "-nan", "null", "none",
];

/// A column is a metric when at least this share of its non-missing cells parse.
const MIN_NUMERIC_SHARE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct CoercedColumn {
    pub values: Vec<Option<f64>>,
    pub parsed: usize,
    pub rejected: usize,
}

impl CoercedColumn {
    pub fn is_metric(&self) -> bool {
        self.parsed > 0
            && self.parsed as f64 >= MIN_NUMERIC_SHARE * (self.parsed + self.rejected) as f64
    }
}

/// Numeric view of one column. Blank cells, missing tokens and non-finite
/// numbers become `None`; any other text is `None` and counted as rejected.
pub fn coerce_numeric(rows: &[Vec<String>], col: usize) -> CoercedColumn {
    let mut values = Vec::with_capacity(rows.len());
    let mut parsed = 0usize;
    let mut rejected = 0usize;
    for row in rows {
        let cell = row.get(col).map(|s| s.trim()).unwrap_or("");
        if is_missing_token(cell) {
            values.push(None);
            continue;
        }
        match cell.parse::<f64>() {
            Ok(v) if v.is_finite() => {
                parsed += 1;
                values.push(Some(v));
            }
            Ok(_) => values.push(None),
            Err(_) => {
                rejected += 1;
                values.push(None);
            }
        }
    }
    CoercedColumn {
        values,
        parsed,
        rejected,
    }
}

fn is_missing_token(cell: &str) -> bool {
    cell.is_empty() || MISSING_TOKENS.iter().any(|t| cell.eq_ignore_ascii_case(t))
}

pub fn impute_mean(values: Vec<Option<f64>>) -> Vec<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0f64, 0usize), |(s, c), &v| (s + v, c + 1));
    let mean = if count == 0 { 0.0 } else { sum / count as f64 };
    values.into_iter().map(|v| v.unwrap_or(mean)).collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_prepare.rs"]
mod tests;
