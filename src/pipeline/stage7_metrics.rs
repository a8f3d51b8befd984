use crate::model::label::{Label, count_anomalous};
use crate::model::quality::Confusion;
use crate::pipeline::stage2_inject::TruthVectors;
use crate::pipeline::stage3_partition::Partition;
use crate::pipeline::stage5_aggregate::AnomalyColumns;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricQuality {
    pub metric: String,
    pub confusion: Confusion,
    pub injected: usize,
    pub flagged: usize,
}

impl MetricQuality {
    pub fn precision(&self) -> f64 {
        self.confusion.precision()
    }

    pub fn recall(&self) -> f64 {
        self.confusion.recall()
    }

    pub fn f1(&self) -> f64 {
        self.confusion.f1()
    }
}

/// Concatenates per-entity slices in partition order and scores the
/// predictions against the injected truth, one entry per metric.
pub fn evaluate(
    metric_names: &[String],
    truth: &TruthVectors,
    anomalies: &AnomalyColumns,
    partitions: &[Partition],
) -> Vec<MetricQuality> {
    metric_names
        .iter()
        .enumerate()
        .map(|(metric, name)| {
            let truth_column = truth.metric(metric);
            let predicted_column = anomalies.metric(metric);
            let mut y_true: Vec<Label> = Vec::new();
            let mut y_pred: Vec<Label> = Vec::new();
            for partition in partitions {
                y_true.extend(partition.rows.iter().map(|&r| truth_column[r]));
                y_pred.extend(partition.rows.iter().map(|&r| predicted_column[r]));
            }
            MetricQuality {
                metric: name.clone(),
                confusion: Confusion::from_labels(&y_true, &y_pred),
                injected: count_anomalous(&y_true),
                flagged: count_anomalous(&y_pred),
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage7_metrics.rs"]
mod tests;
