use super::*;
use chrono::NaiveDate;

fn table(entity: &[&str], dates: Vec<Option<NaiveDate>>) -> ObservationTable {
    let n = entity.len();
    ObservationTable {
        columns: vec![],
        text: vec![vec![]; n],
        entity: entity.iter().map(|s| s.to_string()).collect(),
        dates,
        metric_names: vec![],
        metric_columns: vec![],
        metrics: vec![],
    }
}

fn d(day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2024, 1, day)
}

#[test]
fn test_partitions_sorted_by_entity_then_date() {
    let t = table(
        &["B", "A", "B", "A", "A"],
        vec![d(3), d(2), d(1), None, d(1)],
    );
    let parts = partition_by_entity(&t);
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].entity, "A");
    assert_eq!(parts[0].rows, vec![4, 1, 3]);
    assert_eq!(parts[1].entity, "B");
    assert_eq!(parts[1].rows, vec![2, 0]);
}

#[test]
fn test_equal_dates_keep_file_order() {
    let t = table(&["A", "A", "A"], vec![d(1), d(1), None]);
    let parts = partition_by_entity(&t);
    assert_eq!(parts[0].rows, vec![0, 1, 2]);
}

#[test]
fn test_row_sets_are_disjoint_and_complete() {
    let t = table(&["x", "y", "x", "z", "y"], vec![None; 5]);
    let parts = partition_by_entity(&t);
    let mut all: Vec<usize> = parts.iter().flat_map(|p| p.rows.clone()).collect();
    all.sort_unstable();
    assert_eq!(all, vec![0, 1, 2, 3, 4]);
}
