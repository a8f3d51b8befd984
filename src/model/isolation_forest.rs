use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::model::grid::CandidateConfig;
use crate::model::label::Label;

const MAX_SAMPLES: usize = 256;
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("n_estimators must be >= 1")]
    NoEstimators,
    #[error("contamination must be in (0, 0.5]; got {0}")]
    Contamination(f64),
    #[error("configuration grid is empty")]
    EmptyGrid,
    #[error("cannot fit an isolation forest on an empty sample")]
    EmptySample,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        value: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// Single randomized isolation tree over one feature, stored as a flat arena.
#[derive(Debug, Clone)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    pub fn fit(sample: &[f64], height_limit: usize, rng: &mut StdRng) -> Self {
        let mut nodes = Vec::new();
        let mut values = sample.to_vec();
        grow(&mut nodes, &mut values, 0, height_limit, rng);
        Self { nodes }
    }

    pub fn path_length(&self, x: f64) -> f64 {
        let mut idx = 0usize;
        let mut depth = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { size } => return depth as f64 + average_path_length(*size),
                Node::Split { value, left, right } => {
                    idx = if x < *value { *left } else { *right };
                    depth += 1;
                }
            }
        }
    }

    #[cfg(test)]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

fn grow(
    nodes: &mut Vec<Node>,
    values: &mut [f64],
    depth: usize,
    height_limit: usize,
    rng: &mut StdRng,
) -> usize {
    let id = nodes.len();
    nodes.push(Node::Leaf { size: values.len() });
    if depth >= height_limit || values.len() <= 1 {
        return id;
    }

    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !(max > min) {
        return id;
    }

    let split = rng.gen_range(min..max);
    let mut boundary = 0usize;
    for i in 0..values.len() {
        if values[i] < split {
            values.swap(i, boundary);
            boundary += 1;
        }
    }

    let (lower, upper) = values.split_at_mut(boundary);
    let left = grow(nodes, lower, depth + 1, height_limit, rng);
    let right = grow(nodes, upper, depth + 1, height_limit, rng);
    nodes[id] = Node::Split {
        value: split,
        left,
        right,
    };
    id
}

/// Expected path length of an unsuccessful BST search over `n` points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Univariate isolation forest. Anomaly scores live in (0, 1]; higher means
/// easier to isolate. The decision threshold is placed so that roughly
/// `contamination` of the training rows score above it.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    config: CandidateConfig,
    seed: u64,
    trees: Vec<IsolationTree>,
    sample_size: usize,
    threshold: f64,
}

impl IsolationForest {
    pub fn new(config: CandidateConfig, seed: u64) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self {
            config,
            seed,
            trees: Vec::new(),
            sample_size: 0,
            threshold: f64::INFINITY,
        })
    }

    pub fn fit(&mut self, values: &[f64]) -> Result<(), ModelError> {
        if values.is_empty() {
            return Err(ModelError::EmptySample);
        }
        let sample_size = values.len().min(MAX_SAMPLES);
        let height_limit = (sample_size as f64).log2().ceil().max(0.0) as usize;

        // Each tree owns its RNG stream so a fit never depends on evaluation order.
        self.trees = (0..self.config.n_estimators)
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(tree_seed(self.seed, t));
                let picked = sample(&mut rng, values.len(), sample_size);
                let subsample: Vec<f64> = picked.iter().map(|i| values[i]).collect();
                IsolationTree::fit(&subsample, height_limit, &mut rng)
            })
            .collect();
        self.sample_size = sample_size;

        let scores = self.score_samples(values);
        self.threshold = percentile(&scores, 100.0 * (1.0 - self.config.contamination));
        Ok(())
    }

    pub fn score_samples(&self, values: &[f64]) -> Vec<f64> {
        let normalizer = average_path_length(self.sample_size);
        values
            .iter()
            .map(|&x| {
                if self.trees.is_empty() || normalizer <= 0.0 {
                    return 0.5;
                }
                let mean_depth = self.trees.iter().map(|t| t.path_length(x)).sum::<f64>()
                    / self.trees.len() as f64;
                2f64.powf(-mean_depth / normalizer)
            })
            .collect()
    }

    pub fn predict(&self, values: &[f64]) -> Vec<Label> {
        self.score_samples(values)
            .into_iter()
            .map(|s| {
                if s > self.threshold {
                    Label::Anomalous
                } else {
                    Label::Normal
                }
            })
            .collect()
    }

    pub fn fit_predict(&mut self, values: &[f64]) -> Result<Vec<Label>, ModelError> {
        self.fit(values)?;
        Ok(self.predict(values))
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn config(&self) -> CandidateConfig {
        self.config
    }

    pub fn trees(&self) -> &[IsolationTree] {
        &self.trees
    }
}

fn tree_seed(seed: u64, tree: usize) -> u64 {
    seed ^ (tree as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Linear-interpolated percentile, `p` in [0, 100].
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/isolation_forest.rs"]
mod tests;
