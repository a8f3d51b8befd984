use super::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn table(n_rows: usize, metrics: Vec<Vec<f64>>) -> ObservationTable {
    let names: Vec<String> = (0..metrics.len()).map(|i| format!("kpi{i}")).collect();
    ObservationTable {
        columns: names.clone(),
        text: vec![vec![String::new(); names.len()]; n_rows],
        entity: vec!["A".to_string(); n_rows],
        dates: vec![None; n_rows],
        metric_columns: (0..names.len()).collect(),
        metric_names: names,
        metrics,
    }
}

fn ramp(n: usize) -> Vec<f64> {
    (0..n).map(|i| (i % 10) as f64).collect()
}

#[test]
fn test_injects_floor_rate_rows_shared_across_metrics() {
    let t = table(200, vec![ramp(200), ramp(200)]);
    let mut rng = StdRng::seed_from_u64(3);
    let out = inject_anomalies(&t, 0.05, &mut rng).unwrap();

    assert_eq!(out.injected_rows.len(), 10);
    let mut unique = out.injected_rows.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), 10);

    for m in 0..2 {
        let truth = out.truth.metric(m);
        assert_eq!(truth.iter().filter(|l| l.is_anomalous()).count(), 10);
        for (row, label) in truth.iter().enumerate() {
            assert_eq!(label.is_anomalous(), out.injected_rows.contains(&row));
        }
    }
}

#[test]
fn test_input_table_is_not_mutated() {
    let t = table(100, vec![ramp(100)]);
    let before = t.clone();
    let mut rng = StdRng::seed_from_u64(11);
    let out = inject_anomalies(&t, 0.1, &mut rng).unwrap();
    assert_eq!(t, before);

    let sigma = sample_std(&t.metrics[0]);
    for &row in &out.injected_rows {
        let delta = out.table.metrics[0][row] - t.metrics[0][row];
        assert!(delta > sigma, "row {row} delta {delta}");
    }
    for row in 0..100 {
        if !out.injected_rows.contains(&row) {
            assert_eq!(out.table.metrics[0][row], t.metrics[0][row]);
        }
    }
}

#[test]
fn test_zero_variance_metric_is_labelled_but_unchanged() {
    let t = table(40, vec![vec![7.0; 40]]);
    let mut rng = StdRng::seed_from_u64(5);
    let out = inject_anomalies(&t, 0.25, &mut rng).unwrap();
    assert_eq!(out.table.metrics[0], vec![7.0; 40]);
    assert_eq!(
        out.truth.metric(0).iter().filter(|l| l.is_anomalous()).count(),
        10
    );
}

#[test]
fn test_same_seed_same_injection() {
    let t = table(50, vec![ramp(50)]);
    let a = inject_anomalies(&t, 0.1, &mut StdRng::seed_from_u64(1)).unwrap();
    let b = inject_anomalies(&t, 0.1, &mut StdRng::seed_from_u64(1)).unwrap();
    assert_eq!(a.injected_rows, b.injected_rows);
    assert_eq!(a.table, b.table);
}

#[test]
fn test_invalid_rate_rejected() {
    let t = table(10, vec![ramp(10)]);
    let mut rng = StdRng::seed_from_u64(1);
    assert!(matches!(
        inject_anomalies(&t, 1.5, &mut rng),
        Err(PipelineError::InvalidParameter(_))
    ));
}

#[test]
fn test_sample_std() {
    assert_eq!(sample_std(&[1.0]), 0.0);
    assert!((sample_std(&[1.0, 3.0]) - std::f64::consts::SQRT_2).abs() < 1e-12);
}
