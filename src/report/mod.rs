use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::pipeline::stage3_partition::Partition;
use crate::pipeline::stage5_aggregate::AnomalyColumns;
use crate::pipeline::stage7_metrics::MetricQuality;

pub mod json;
pub mod text;

const RISK_HIGH_PCT: f64 = 20.0;
const RISK_MEDIUM_PCT: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualitySummary {
    pub n_metrics: usize,
    pub mean_precision: f64,
    pub mean_recall: f64,
    pub mean_f1: f64,
    pub best_metric: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySummary {
    pub entity: String,
    pub flagged: usize,
    pub measurements: usize,
    pub anomaly_rate_pct: f64,
    pub top_metric: String,
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub flagged: usize,
    pub measurements: usize,
    pub anomaly_rate_pct: f64,
}

pub fn summarize_quality(rows: &[MetricQuality]) -> QualitySummary {
    if rows.is_empty() {
        return QualitySummary {
            n_metrics: 0,
            mean_precision: 0.0,
            mean_recall: 0.0,
            mean_f1: 0.0,
            best_metric: "N/A".to_string(),
        };
    }
    let n = rows.len() as f64;
    let mut best = &rows[0];
    for row in &rows[1..] {
        if row.f1() > best.f1() {
            best = row;
        }
    }
    QualitySummary {
        n_metrics: rows.len(),
        mean_precision: rows.iter().map(|r| r.precision()).sum::<f64>() / n,
        mean_recall: rows.iter().map(|r| r.recall()).sum::<f64>() / n,
        mean_f1: rows.iter().map(|r| r.f1()).sum::<f64>() / n,
        best_metric: best.metric.clone(),
    }
}

pub fn risk_level(rate_pct: f64) -> RiskLevel {
    if rate_pct > RISK_HIGH_PCT {
        RiskLevel::High
    } else if rate_pct > RISK_MEDIUM_PCT {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Flag counts over every (row, metric) cell an entity owns.
pub fn summarize_entities(
    partitions: &[Partition],
    metric_names: &[String],
    anomalies: &AnomalyColumns,
) -> Vec<EntitySummary> {
    partitions
        .iter()
        .map(|p| {
            let per_metric: Vec<usize> = (0..metric_names.len())
                .map(|m| {
                    p.rows
                        .iter()
                        .filter(|&&r| anomalies.get(m, r).is_anomalous())
                        .count()
                })
                .collect();
            let flagged: usize = per_metric.iter().sum();
            let measurements = p.rows.len() * metric_names.len();
            let rate = percent(flagged, measurements);

            let mut top_metric = "None".to_string();
            let mut top_count = 0usize;
            for (m, &count) in per_metric.iter().enumerate() {
                if count > top_count {
                    top_count = count;
                    top_metric = metric_names[m].clone();
                }
            }

            EntitySummary {
                entity: p.entity.clone(),
                flagged,
                measurements,
                anomaly_rate_pct: rate,
                top_metric,
                risk: risk_level(rate),
            }
        })
        .collect()
}

/// Per-date flag counts across all entities; rows without a date are left out.
pub fn daily_trend(dates: &[Option<NaiveDate>], anomalies: &AnomalyColumns) -> Vec<TrendPoint> {
    let n_metrics = anomalies.n_metrics();
    let mut by_date: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for (row, date) in dates.iter().enumerate() {
        let Some(date) = date else {
            continue;
        };
        let flagged = (0..n_metrics)
            .filter(|&m| anomalies.get(m, row).is_anomalous())
            .count();
        let entry = by_date.entry(*date).or_insert((0, 0));
        entry.0 += flagged;
        entry.1 += n_metrics;
    }
    by_date
        .into_iter()
        .map(|(date, (flagged, measurements))| TrendPoint {
            date,
            flagged,
            measurements,
            anomaly_rate_pct: percent(flagged, measurements),
        })
        .collect()
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

pub fn format_f64_6(v: f64) -> String {
    format!("{:.6}", v)
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
