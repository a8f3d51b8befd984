use super::*;
use crate::pipeline::stage4_score::{EntityResult, MetricOutcome};
use crate::pipeline::stage5_aggregate::merge_results;
use Label::{Anomalous as A, Normal as N};

fn names() -> Vec<String> {
    ["Throughput", "PATHLOSS", "Cell Availability", "Active_Users"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn anomalies(columns: Vec<Vec<Label>>) -> AnomalyColumns {
    let n_rows = columns[0].len();
    let result = EntityResult {
        entity: "A".to_string(),
        rows: (0..n_rows).collect(),
        metrics: columns
            .into_iter()
            .map(|c| MetricOutcome {
                prediction: Some(c),
                best: None,
            })
            .collect(),
    };
    merge_results(n_rows, &names(), &[result]).anomalies
}

fn rule() -> RcaRule {
    RcaRule {
        target: "Throughput".to_string(),
        sources: vec![
            "Active_Users".to_string(),
            "Missing KPI".to_string(),
            "PATHLOSS".to_string(),
        ],
    }
}

#[test]
fn test_remarks_follow_target_flags() {
    let cols = anomalies(vec![
        vec![A, A, N, N],
        vec![A, N, A, N],
        vec![A, N, N, N],
        vec![A, N, N, A],
    ]);
    let out = annotate(&names(), &cols, &[rule()]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].header(), "Throughput_RCA_Remark");
    let r = &out[0].remarks;
    assert_eq!(r[0], "Throughput is impacted due to Active_Users, PATHLOSS");
    assert_eq!(r[1], "Throughput has an anomaly but no significant RCA found");
    assert_eq!(r[2], "");
    assert_eq!(r[3], "");
}

#[test]
fn test_remark_empty_iff_target_normal() {
    let cols = anomalies(vec![
        vec![A, N, A, N, A],
        vec![N, A, A, N, N],
        vec![N; 5],
        vec![N; 5],
    ]);
    let out = annotate(&names(), &cols, &[rule()]);
    for (row, remark) in out[0].remarks.iter().enumerate() {
        assert_eq!(remark.is_empty(), !cols.get(0, row).is_anomalous());
    }
}

#[test]
fn test_unscored_target_is_skipped() {
    let cols = anomalies(vec![vec![A]; 4]);
    let missing = RcaRule {
        target: "Latency".to_string(),
        sources: vec!["PATHLOSS".to_string()],
    };
    assert!(annotate(&names(), &cols, &[missing]).is_empty());
}

#[test]
fn test_remark_for_row() {
    assert_eq!(remark_for_row("T", Label::Normal, &["x"]), "");
    assert_eq!(
        remark_for_row("T", Label::Anomalous, &["x", "y"]),
        "T is impacted due to x, y"
    );
}
