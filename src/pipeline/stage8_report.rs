use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::input::ObservationTable;
use crate::model::profile::DetectionProfile;
use crate::pipeline::PipelineError;
use crate::pipeline::stage3_partition::Partition;
use crate::pipeline::stage5_aggregate::{AnomalyColumns, BestConfigRow};
use crate::pipeline::stage6_rca::RcaColumn;
use crate::pipeline::stage7_metrics::MetricQuality;
use crate::report::json::{DetectionSection, InputSection, MetricEntry, SummaryJson, render_summary_json};
use crate::report::text::{ReportContext, render_report_text};
use crate::report::{
    EntitySummary, RiskLevel, TrendPoint, daily_trend, format_f64_6, summarize_entities,
    summarize_quality,
};

pub const ANOMALIES_FILE: &str = "anomalies.csv";
pub const METRICS_FILE: &str = "metrics.csv";
pub const BEST_CONFIGS_FILE: &str = "best_configs.csv";
pub const ENTITIES_FILE: &str = "entities.csv";
pub const TREND_FILE: &str = "trend.csv";
pub const SUMMARY_FILE: &str = "summary.json";
pub const REPORT_FILE: &str = "report.txt";

#[derive(Debug, Clone)]
pub struct Stage8Input<'a> {
    pub table: &'a ObservationTable,
    pub partitions: &'a [Partition],
    pub anomalies: &'a AnomalyColumns,
    pub best_configs: &'a [BestConfigRow],
    pub rca: &'a [RcaColumn],
    pub quality: &'a [MetricQuality],
    pub injected_rows: usize,
    pub profile: &'a DetectionProfile,
    pub input_path: String,
    pub tool_name: String,
    pub tool_version: String,
}

/// Writes every artifact. Each file is staged under a temporary name and
/// renamed into place, so a failed step leaves no partial file behind and
/// files from earlier steps stay intact.
pub fn write_reports(input: &Stage8Input<'_>, out_dir: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(out_dir).map_err(|source| PipelineError::Output {
        path: out_dir.display().to_string(),
        source,
    })?;

    write_atomic(&out_dir.join(ANOMALIES_FILE), |w| write_anomalies_csv(input, w))?;
    write_atomic(&out_dir.join(METRICS_FILE), |w| {
        write_metrics_csv(input.quality, w)
    })?;
    write_atomic(&out_dir.join(BEST_CONFIGS_FILE), |w| {
        write_best_configs_csv(input.best_configs, w)
    })?;

    let entities = summarize_entities(
        input.partitions,
        &input.table.metric_names,
        input.anomalies,
    );
    write_atomic(&out_dir.join(ENTITIES_FILE), |w| {
        write_entities_csv(&entities, w)
    })?;

    let trend = daily_trend(&input.table.dates, input.anomalies);
    write_atomic(&out_dir.join(TREND_FILE), |w| write_trend_csv(&trend, w))?;

    let quality = summarize_quality(input.quality);
    let summary = build_summary(input, &entities, quality.clone());
    let json = render_summary_json(&summary)?;
    write_atomic(&out_dir.join(SUMMARY_FILE), |w| {
        w.write_all(json.as_bytes())?;
        Ok(())
    })?;

    let report = render_report_text(&ReportContext {
        n_rows: input.table.n_rows(),
        n_entities: input.partitions.len(),
        injected_rows: input.injected_rows,
        quality: &quality,
        entities: &entities,
        trend: &trend,
    });
    write_atomic(&out_dir.join(REPORT_FILE), |w| {
        w.write_all(report.as_bytes())?;
        Ok(())
    })?;

    tracing::info!(out_dir = %out_dir.display(), "reports written");
    Ok(())
}

fn write_atomic<F>(path: &Path, body: F) -> Result<(), PipelineError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), PipelineError>,
{
    let tmp = path.with_extension("partial");
    let staged = File::create(&tmp)
        .map_err(|source| PipelineError::Output {
            path: tmp.display().to_string(),
            source,
        })
        .and_then(|file| {
            let mut w = BufWriter::new(file);
            body(&mut w)?;
            w.flush()?;
            Ok(())
        })
        .and_then(|()| {
            fs::rename(&tmp, path).map_err(|source| PipelineError::Output {
                path: path.display().to_string(),
                source,
            })
        });
    if let Err(err) = &staged {
        let _ = fs::remove_file(&tmp);
        tracing::error!(path = %path.display(), error = %err, "failed to write output");
    }
    staged
}

/// Input columns (metrics carry injected values), then one `_anomaly`
/// column per metric, then one `_RCA_Remark` column per annotated target.
pub fn write_anomalies_csv(input: &Stage8Input<'_>, w: &mut dyn Write) -> Result<(), PipelineError> {
    let table = input.table;
    let mut wtr = csv::Writer::from_writer(w);

    let mut header: Vec<String> = table.columns.clone();
    header.extend(table.metric_names.iter().map(|m| format!("{m}_anomaly")));
    header.extend(input.rca.iter().map(|c| c.header()));
    wtr.write_record(&header)?;

    for row in 0..table.n_rows() {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        for col in 0..table.columns.len() {
            match table.metric_at_column(col) {
                Some(m) => record.push(table.metrics[m][row].to_string()),
                None => record.push(table.text[row].get(col).cloned().unwrap_or_default()),
            }
        }
        for m in 0..table.n_metrics() {
            record.push(input.anomalies.get(m, row).to_string());
        }
        for column in input.rca {
            record.push(column.remarks[row].clone());
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_metrics_csv(rows: &[MetricQuality], w: &mut dyn Write) -> Result<(), PipelineError> {
    let mut wtr = csv::Writer::from_writer(w);
    wtr.write_record([
        "metric",
        "precision",
        "recall",
        "f1",
        "true_positives",
        "false_positives",
        "false_negatives",
        "injected",
    ])?;
    for r in rows {
        wtr.write_record([
            r.metric.clone(),
            format_f64_6(r.precision()),
            format_f64_6(r.recall()),
            format_f64_6(r.f1()),
            r.confusion.true_positives.to_string(),
            r.confusion.false_positives.to_string(),
            r.confusion.false_negatives.to_string(),
            r.injected.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_best_configs_csv(rows: &[BestConfigRow], w: &mut dyn Write) -> Result<(), PipelineError> {
    let mut wtr = csv::Writer::from_writer(w);
    wtr.write_record(["entity", "metric", "n_estimators", "contamination", "f1"])?;
    for r in rows {
        wtr.write_record([
            r.entity.clone(),
            r.metric.clone(),
            r.best.config.n_estimators.to_string(),
            r.best.config.contamination.to_string(),
            format_f64_6(r.best.f1),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_entities_csv(rows: &[EntitySummary], w: &mut dyn Write) -> Result<(), PipelineError> {
    let mut wtr = csv::Writer::from_writer(w);
    wtr.write_record([
        "entity",
        "flagged",
        "measurements",
        "anomaly_rate_pct",
        "top_metric",
        "risk",
    ])?;
    for r in rows {
        wtr.write_record([
            r.entity.clone(),
            r.flagged.to_string(),
            r.measurements.to_string(),
            format_f64_6(r.anomaly_rate_pct),
            r.top_metric.clone(),
            r.risk.as_str().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_trend_csv(rows: &[TrendPoint], w: &mut dyn Write) -> Result<(), PipelineError> {
    let mut wtr = csv::Writer::from_writer(w);
    wtr.write_record(["date", "flagged", "measurements", "anomaly_rate_pct"])?;
    for r in rows {
        wtr.write_record([
            r.date.format("%Y-%m-%d").to_string(),
            r.flagged.to_string(),
            r.measurements.to_string(),
            format_f64_6(r.anomaly_rate_pct),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn build_summary(
    input: &Stage8Input<'_>,
    entities: &[EntitySummary],
    quality: crate::report::QualitySummary,
) -> SummaryJson {
    SummaryJson {
        tool: input.tool_name.clone(),
        version: input.tool_version.clone(),
        input: InputSection {
            path: input.input_path.clone(),
            rows: input.table.n_rows(),
            entities: input.partitions.len(),
            metrics: input.table.n_metrics(),
        },
        detection: DetectionSection {
            injection_rate: input.profile.injection_rate,
            injected_rows: input.injected_rows,
            injection_seed: input.profile.injection_seed,
            model_seed: input.profile.model_seed,
            grid: input.profile.grid.clone(),
            rca_targets: input.rca.iter().map(|c| c.target.clone()).collect(),
        },
        quality,
        metrics: input
            .quality
            .iter()
            .map(|r| MetricEntry {
                metric: r.metric.clone(),
                precision: r.precision(),
                recall: r.recall(),
                f1: r.f1(),
                injected: r.injected,
                flagged: r.flagged,
            })
            .collect(),
        high_risk_entities: entities
            .iter()
            .filter(|e| e.risk == RiskLevel::High)
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage8_report.rs"]
mod tests;
