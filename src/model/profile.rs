use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::grid::ConfigGrid;
use crate::model::isolation_forest::ModelError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading profile {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("profile is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid profile: {0}")]
    Invalid(String),
    #[error("invalid configuration grid: {0}")]
    Grid(#[from] ModelError),
}

/// Ordered target metric and the candidate causes inspected when it is flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RcaRule {
    pub target: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionProfile {
    pub entity_column: String,
    pub date_column: String,
    pub date_format: String,
    pub injection_rate: f64,
    pub injection_seed: Option<u64>,
    pub model_seed: u64,
    pub grid: ConfigGrid,
    pub rca: Vec<RcaRule>,
    pub threads: usize,
}

impl Default for DetectionProfile {
    fn default() -> Self {
        Self::default_v1()
    }
}

impl DetectionProfile {
    pub fn default_v1() -> Self {
        Self {
            entity_column: "Cell_Name".to_string(),
            date_column: "Date".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            injection_rate: 0.05,
            injection_seed: None,
            model_seed: 42,
            grid: ConfigGrid::default(),
            rca: default_rca_rules(),
            threads: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entity_column.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "entity_column must not be empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.injection_rate) {
            return Err(ConfigError::Invalid(format!(
                "injection_rate must be in [0, 1]; got {}",
                self.injection_rate
            )));
        }
        for rule in &self.rca {
            if rule.target.is_empty() {
                return Err(ConfigError::Invalid(
                    "rca rule with empty target".to_string(),
                ));
            }
        }
        self.grid.validate()?;
        Ok(())
    }
}

pub fn load_profile(path: &Path) -> Result<DetectionProfile, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let profile: DetectionProfile = serde_json::from_str(&text)?;
    profile.validate()?;
    Ok(profile)
}

fn default_rca_rules() -> Vec<RcaRule> {
    const SOURCES: &[&str] = &[
        "PATHLOSS",
        "Average CQI ( 256 QAM)",
        "Cell Availability",
        "DL BLER (%)  -  gNB",
        "UL RSSI (dBm/PRB)  -  gNB",
        "Avg. Overall DL Latency (ms)  -  gNB",
        "DL RBSym Utilization (per resource partition is also ok since 1PLMN=1partition)",
        "NR_DL_256QAM",
        "NR_DL_64QAM",
        "NR_DL_16QAM",
        "NR_DL_QPSK",
        "Maximum number of RRC Connected Users in NSA dual connectivity",
        "Active_Users",
        "Total_Traffic_Vol_GB",
        "MIMO Utilisation",
    ];
    vec![RcaRule {
        target: "Average ENDC User DL Throughpu(Mbps)".to_string(),
        sources: SOURCES.iter().map(|s| s.to_string()).collect(),
    }]
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/profile.rs"]
mod tests;
