use super::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::model::label::Label;

/// Two cells, 100 daily rows each, one smooth KPI.
fn scenario_table() -> RawTable {
    let mut rows = Vec::new();
    for cell in ["CELL_001", "CELL_002"] {
        for day in 0..100u32 {
            let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                + chrono::Duration::days(day as i64);
            let value = 50.0 + ((day * 13) % 17) as f64 * 0.5;
            rows.push(vec![
                cell.to_string(),
                date.format("%Y-%m-%d").to_string(),
                format!("{value}"),
            ]);
        }
    }
    RawTable {
        headers: vec![
            "Cell_Name".to_string(),
            "Date".to_string(),
            "Active_Users".to_string(),
        ],
        rows,
    }
}

fn profile() -> DetectionProfile {
    let mut p = DetectionProfile::default_v1();
    p.threads = 2;
    p.rca = vec![crate::model::profile::RcaRule {
        target: "Active_Users".to_string(),
        sources: vec!["PATHLOSS".to_string()],
    }];
    p
}

#[test]
fn test_two_entity_scenario() {
    let mut rng = StdRng::seed_from_u64(2024);
    let out = run_pipeline(scenario_table(), &profile(), &mut rng).unwrap();

    assert_eq!(out.table.n_rows(), 200);
    assert_eq!(out.injected_rows.len(), 10);
    assert_eq!(out.partitions.len(), 2);
    assert_eq!(out.anomalies.metric(0).len(), 200);
    assert!(out.anomalies.metric(0).iter().any(|l| *l == Label::Anomalous));

    assert_eq!(out.quality.len(), 1);
    let q = &out.quality[0];
    assert!((0.0..=1.0).contains(&q.f1()));
    assert_eq!(q.injected, 10);

    assert_eq!(out.rca.len(), 1);
    for (row, remark) in out.rca[0].remarks.iter().enumerate() {
        let flagged = out.anomalies.get(0, row).is_anomalous();
        assert_eq!(remark.is_empty(), !flagged);
        if flagged {
            assert_eq!(
                remark,
                "Active_Users has an anomaly but no significant RCA found"
            );
        }
    }
    assert_eq!(out.best_configs.len(), 2);
}

#[test]
fn test_pipeline_is_reproducible_with_seed() {
    let a = run_pipeline(scenario_table(), &profile(), &mut StdRng::seed_from_u64(7)).unwrap();
    let b = run_pipeline(scenario_table(), &profile(), &mut StdRng::seed_from_u64(7)).unwrap();
    assert_eq!(a.injected_rows, b.injected_rows);
    assert_eq!(a.anomalies, b.anomalies);
    assert_eq!(a.quality, b.quality);
}

#[test]
fn test_missing_entity_column_aborts() {
    let mut raw = scenario_table();
    raw.headers[0] = "Site".to_string();
    let err = run_pipeline(raw, &profile(), &mut StdRng::seed_from_u64(1)).unwrap_err();
    assert!(matches!(err, PipelineError::Input(InputError::MissingColumn(_))));
}

#[test]
fn test_invalid_profile_aborts() {
    let mut p = profile();
    p.grid.n_estimators.clear();
    let err = run_pipeline(scenario_table(), &p, &mut StdRng::seed_from_u64(1)).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}
