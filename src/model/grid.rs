use serde::{Deserialize, Serialize};

use crate::model::isolation_forest::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateConfig {
    pub n_estimators: usize,
    pub contamination: f64,
}

impl CandidateConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_estimators == 0 {
            return Err(ModelError::NoEstimators);
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(ModelError::Contamination(self.contamination));
        }
        Ok(())
    }
}

impl std::fmt::Display for CandidateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n_estimators={} contamination={}",
            self.n_estimators, self.contamination
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigGrid {
    pub n_estimators: Vec<usize>,
    pub contamination: Vec<f64>,
}

impl Default for ConfigGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![100],
            contamination: vec![0.05],
        }
    }
}

impl ConfigGrid {
    /// Cartesian product, ensemble size major. Search order decides ties.
    pub fn candidates(&self) -> Vec<CandidateConfig> {
        let mut out = Vec::with_capacity(self.len());
        for &n_estimators in &self.n_estimators {
            for &contamination in &self.contamination {
                out.push(CandidateConfig {
                    n_estimators,
                    contamination,
                });
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.n_estimators.len() * self.contamination.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.is_empty() {
            return Err(ModelError::EmptyGrid);
        }
        for candidate in self.candidates() {
            candidate.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/grid.rs"]
mod tests;
