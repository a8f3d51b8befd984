use super::*;

fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
    RawTable {
        headers: headers.iter().map(|s| s.to_string()).collect(),
        rows: rows
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect(),
    }
}

fn params() -> Stage1Params<'static> {
    Stage1Params {
        entity_column: "Cell_Name",
        date_column: "Date",
        date_format: "%Y-%m-%d",
    }
}

#[test]
fn test_numeric_columns_become_metrics() {
    let table = run_stage1(
        raw(
            &["Cell_Name", "Date", "Region", "PATHLOSS", "Empty", "Active_Users"],
            &[
                &["A", "2024-01-01", "north", "1.0", "", "10"],
                &["A", "2024-01-02", "north", "", "", "20"],
                &["B", "2024-01-01", "south", "3.0", "", "30"],
            ],
        ),
        &params(),
    )
    .unwrap();

    assert_eq!(table.metric_names, vec!["PATHLOSS", "Active_Users"]);
    assert_eq!(table.metric_columns, vec![3, 5]);
    assert_eq!(table.metrics[0], vec![1.0, 2.0, 3.0]);
    assert_eq!(table.metrics[1], vec![10.0, 20.0, 30.0]);
    assert_eq!(table.entity, vec!["A", "A", "B"]);
    assert_eq!(table.metric_at_column(5), Some(1));
    assert_eq!(table.metric_at_column(2), None);
}

#[test]
fn test_unparseable_dates_are_missing() {
    let table = run_stage1(
        raw(
            &["Cell_Name", "Date", "KPI"],
            &[&["A", "2024-13-01", "1"], &["A", "01/02/2024", "2"], &["A", "2024-02-03", "3"]],
        ),
        &params(),
    )
    .unwrap();
    assert_eq!(table.dates[0], None);
    assert_eq!(table.dates[1], None);
    assert_eq!(table.dates[2], NaiveDate::from_ymd_opt(2024, 2, 3));
}

#[test]
fn test_missing_entity_column_fails() {
    let err = run_stage1(raw(&["Site", "Date", "KPI"], &[&["A", "2024-01-01", "1"]]), &params())
        .unwrap_err();
    assert!(matches!(err, InputError::MissingColumn(ref c) if c == "Cell_Name"));
}

#[test]
fn test_missing_date_column_is_tolerated() {
    let table = run_stage1(raw(&["Cell_Name", "KPI"], &[&["A", "1"]]), &params()).unwrap();
    assert_eq!(table.dates, vec![None]);
    assert_eq!(table.metric_names, vec!["KPI"]);
}

#[test]
fn test_missing_tokens_are_imputed_not_dropped() {
    let table = run_stage1(
        raw(
            &["Cell_Name", "PATHLOSS", "CQI"],
            &[&["A", "1.5", "NULL"], &["A", "N/A", "7"], &["A", "2.5", "-"]],
        ),
        &params(),
    )
    .unwrap();
    assert_eq!(table.metric_names, vec!["PATHLOSS", "CQI"]);
    assert_eq!(table.metrics[0], vec![1.5, 2.0, 2.5]);
    assert_eq!(table.metrics[1], vec![7.0, 7.0, 7.0]);
}

#[test]
fn test_coerce_numeric_counts_stray_text() {
    let col = |cells: &[&str]| -> Vec<Vec<String>> {
        cells.iter().map(|c| vec![c.to_string()]).collect()
    };

    let c = coerce_numeric(&col(&["1", "n/a", "NaN", "", "3"]), 0);
    assert_eq!(c.values, vec![Some(1.0), None, None, None, Some(3.0)]);
    assert_eq!((c.parsed, c.rejected), (2, 0));
    assert!(c.is_metric());

    let c = coerce_numeric(&col(&["1", "2", "err"]), 0);
    assert_eq!(c.values, vec![Some(1.0), Some(2.0), None]);
    assert_eq!(c.rejected, 1);
    assert!(c.is_metric());

    let c = coerce_numeric(&col(&["north", "south", "7"]), 0);
    assert!(!c.is_metric());

    let c = coerce_numeric(&col(&["", "NA"]), 0);
    assert!(!c.is_metric());
}

#[test]
fn test_impute_mean() {
    assert_eq!(impute_mean(vec![Some(1.0), None, Some(3.0)]), vec![1.0, 2.0, 3.0]);
}
