use rayon::prelude::*;

use crate::input::ObservationTable;
use crate::model::grid::CandidateConfig;
use crate::model::isolation_forest::{IsolationForest, ModelError};
use crate::model::label::Label;
use crate::model::quality::f1_score;
use crate::pipeline::PipelineError;
use crate::pipeline::stage2_inject::TruthVectors;
use crate::pipeline::stage3_partition::Partition;

/// Partitions below this size are not fitted; their predictions stay absent.
pub const MIN_ENTITY_ROWS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestConfig {
    pub config: CandidateConfig,
    pub f1: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricOutcome {
    pub prediction: Option<Vec<Label>>,
    pub best: Option<BestConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityResult {
    pub entity: String,
    pub rows: Vec<usize>,
    pub metrics: Vec<MetricOutcome>,
}

/// Self-contained copy of one entity's rows; `values[metric][i]` belongs to `rows[i]`.
#[derive(Debug, Clone)]
pub struct EntityTask {
    pub entity: String,
    pub rows: Vec<usize>,
    pub values: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreContext<'a> {
    pub truth: &'a TruthVectors,
    pub candidates: &'a [CandidateConfig],
    pub seed: u64,
}

pub fn build_tasks(table: &ObservationTable, partitions: &[Partition]) -> Vec<EntityTask> {
    partitions
        .iter()
        .map(|p| EntityTask {
            entity: p.entity.clone(),
            rows: p.rows.clone(),
            values: table
                .metrics
                .iter()
                .map(|column| p.rows.iter().map(|&r| column[r]).collect())
                .collect(),
        })
        .collect()
}

/// Grid search per metric: keep the candidate with strictly greater F1
/// against the injected labels; the first candidate wins ties.
pub fn score_entity(task: &EntityTask, ctx: &ScoreContext<'_>) -> Result<EntityResult, ModelError> {
    let mut metrics = Vec::with_capacity(task.values.len());
    for (metric, values) in task.values.iter().enumerate() {
        if task.rows.len() < MIN_ENTITY_ROWS {
            metrics.push(MetricOutcome::default());
            continue;
        }

        let scaled = standardize(values);
        let truth_column = ctx.truth.metric(metric);
        let truth: Vec<Label> = task.rows.iter().map(|&r| truth_column[r]).collect();

        let mut best_f1 = -1.0f64;
        let mut outcome = MetricOutcome::default();
        for &candidate in ctx.candidates {
            let mut forest = IsolationForest::new(candidate, ctx.seed)?;
            let predicted = forest.fit_predict(&scaled)?;
            let f1 = f1_score(&truth, &predicted);
            tracing::trace!(
                entity = %task.entity,
                metric,
                config = %forest.config(),
                trees = forest.trees().len(),
                threshold = forest.threshold(),
                f1,
                "candidate scored"
            );
            if f1 > best_f1 {
                best_f1 = f1;
                outcome = MetricOutcome {
                    prediction: Some(predicted),
                    best: Some(BestConfig {
                        config: candidate,
                        f1,
                    }),
                };
            }
        }
        metrics.push(outcome);
    }

    tracing::debug!(entity = %task.entity, rows = task.rows.len(), "scored entity");
    Ok(EntityResult {
        entity: task.entity.clone(),
        rows: task.rows.clone(),
        metrics,
    })
}

/// Runs every task on a dedicated pool and waits for all of them. Results
/// come back in task order; one failing entity fails the batch.
pub fn score_all(
    tasks: &[EntityTask],
    ctx: &ScoreContext<'_>,
    threads: usize,
) -> Result<Vec<EntityResult>, PipelineError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("kpianomaly-score-{i}"))
        .build()?;
    tracing::info!(
        entities = tasks.len(),
        candidates = ctx.candidates.len(),
        workers = pool.current_num_threads(),
        "scoring entities"
    );
    let results = pool.install(|| {
        tasks
            .par_iter()
            .map(|task| score_entity(task, ctx))
            .collect::<Result<Vec<_>, _>>()
    })?;
    Ok(results)
}

/// Zero mean / unit variance using this slice's own statistics (population
/// std). These per-entity statistics are unrelated to the global std used
/// for noise injection. A constant slice maps to all zeros.
pub fn standardize(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let std = var.sqrt();
    let scale = if std > 0.0 && std.is_finite() { std } else { 1.0 };
    values.iter().map(|v| (v - mean) / scale).collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_score.rs"]
mod tests;
