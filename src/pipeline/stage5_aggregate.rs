use crate::model::label::Label;
use crate::pipeline::stage4_score::{BestConfig, EntityResult};

/// Per-metric anomaly flags over every table row (`<metric>_anomaly`).
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyColumns {
    labels: Vec<Vec<Label>>,
}

impl AnomalyColumns {
    pub fn all_normal(n_metrics: usize, n_rows: usize) -> Self {
        Self {
            labels: vec![vec![Label::Normal; n_rows]; n_metrics],
        }
    }

    pub fn metric(&self, metric: usize) -> &[Label] {
        &self.labels[metric]
    }

    pub fn n_metrics(&self) -> usize {
        self.labels.len()
    }

    pub fn get(&self, metric: usize, row: usize) -> Label {
        self.labels[metric][row]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BestConfigRow {
    pub entity: String,
    pub metric: String,
    pub best: BestConfig,
}

#[derive(Debug, Clone)]
pub struct Stage5Output {
    pub anomalies: AnomalyColumns,
    pub best_configs: Vec<BestConfigRow>,
}

/// Writes each entity's predictions onto the rows it owns. Row sets are
/// disjoint, so the result does not depend on the order of `results`.
pub fn merge_results(
    n_rows: usize,
    metric_names: &[String],
    results: &[EntityResult],
) -> Stage5Output {
    let mut anomalies = AnomalyColumns::all_normal(metric_names.len(), n_rows);
    let mut keyed: Vec<(&str, usize, BestConfig)> = Vec::new();

    for result in results {
        for (metric, outcome) in result.metrics.iter().enumerate() {
            if let Some(prediction) = &outcome.prediction {
                let column = &mut anomalies.labels[metric];
                for (&row, &label) in result.rows.iter().zip(prediction) {
                    column[row] = label;
                }
            }
            if let Some(best) = outcome.best {
                keyed.push((result.entity.as_str(), metric, best));
            }
        }
    }

    keyed.sort_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(&b.1)));
    let best_configs = keyed
        .into_iter()
        .map(|(entity, metric, best)| BestConfigRow {
            entity: entity.to_string(),
            metric: metric_names[metric].clone(),
            best,
        })
        .collect();

    Stage5Output {
        anomalies,
        best_configs,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_aggregate.rs"]
mod tests;
