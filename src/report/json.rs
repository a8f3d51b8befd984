use serde::Serialize;

use crate::model::grid::ConfigGrid;
use crate::report::{EntitySummary, QualitySummary};

#[derive(Debug, Clone, Serialize)]
pub struct InputSection {
    pub path: String,
    pub rows: usize,
    pub entities: usize,
    pub metrics: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectionSection {
    pub injection_rate: f64,
    pub injected_rows: usize,
    pub injection_seed: Option<u64>,
    pub model_seed: u64,
    pub grid: ConfigGrid,
    pub rca_targets: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricEntry {
    pub metric: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub injected: usize,
    pub flagged: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryJson {
    pub tool: String,
    pub version: String,
    pub input: InputSection,
    pub detection: DetectionSection,
    pub quality: QualitySummary,
    pub metrics: Vec<MetricEntry>,
    pub high_risk_entities: Vec<EntitySummary>,
}

pub fn render_summary_json(summary: &SummaryJson) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string_pretty(summary)?;
    out.push('\n');
    Ok(out)
}
