use std::time::Instant;

use rand::Rng;
use thiserror::Error;

use crate::input::{InputError, ObservationTable, RawTable};
use crate::model::isolation_forest::ModelError;
use crate::model::profile::{ConfigError, DetectionProfile};

pub mod stage1_prepare;
pub mod stage2_inject;
pub mod stage3_partition;
pub mod stage4_score;
pub mod stage5_aggregate;
pub mod stage6_rca;
pub mod stage7_metrics;
pub mod stage8_report;

use stage1_prepare::{Stage1Params, run_stage1};
use stage2_inject::inject_anomalies;
use stage3_partition::{Partition, partition_by_entity};
use stage4_score::{ScoreContext, build_tasks, score_all};
use stage5_aggregate::{AnomalyColumns, BestConfigRow, merge_results};
use stage6_rca::{RcaColumn, annotate};
use stage7_metrics::{MetricQuality, evaluate};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("failed to write {path}: {source}")]
    Output {
        path: String,
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything the report stage needs. Truth vectors stay inside the run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: ObservationTable,
    pub partitions: Vec<Partition>,
    pub injected_rows: Vec<usize>,
    pub anomalies: AnomalyColumns,
    pub best_configs: Vec<BestConfigRow>,
    pub rca: Vec<RcaColumn>,
    pub quality: Vec<MetricQuality>,
}

/// Stages 1 through 7, in memory.
pub fn run_pipeline<R: Rng + ?Sized>(
    raw: RawTable,
    profile: &DetectionProfile,
    rng: &mut R,
) -> Result<PipelineOutput, PipelineError> {
    profile.validate()?;

    let prepared = timed("prepare", || {
        run_stage1(
            raw,
            &Stage1Params {
                entity_column: &profile.entity_column,
                date_column: &profile.date_column,
                date_format: &profile.date_format,
            },
        )
    })?;

    let injected = timed("inject", || {
        inject_anomalies(&prepared, profile.injection_rate, rng)
    })?;
    let table = injected.table;
    let truth = injected.truth;

    let partitions = timed("partition", || partition_by_entity(&table));

    let candidates = profile.grid.candidates();
    let ctx = ScoreContext {
        truth: &truth,
        candidates: &candidates,
        seed: profile.model_seed,
    };
    let results = timed("score", || {
        let tasks = build_tasks(&table, &partitions);
        score_all(&tasks, &ctx, profile.threads)
    })?;

    let merged = timed("aggregate", || {
        merge_results(table.n_rows(), &table.metric_names, &results)
    });
    let rca = timed("rca", || {
        annotate(&table.metric_names, &merged.anomalies, &profile.rca)
    });
    let quality = timed("metrics", || {
        evaluate(&table.metric_names, &truth, &merged.anomalies, &partitions)
    });

    for q in &quality {
        tracing::info!(
            metric = %q.metric,
            precision = q.precision(),
            recall = q.recall(),
            f1 = q.f1(),
            "detection quality"
        );
    }

    Ok(PipelineOutput {
        table,
        partitions,
        injected_rows: injected.injected_rows,
        anomalies: merged.anomalies,
        best_configs: merged.best_configs,
        rca,
        quality,
    })
}

fn timed<T>(stage: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    tracing::info!(
        stage,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "stage finished"
    );
    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/mod.rs"]
mod tests;
