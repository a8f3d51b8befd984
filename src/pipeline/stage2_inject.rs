use rand::Rng;
use rand::seq::index::sample;
use rand_distr::{Distribution, Normal};

use crate::input::ObservationTable;
use crate::model::label::Label;
use crate::pipeline::PipelineError;

const NOISE_MEAN_SIGMAS: f64 = 5.0;
const NOISE_STD_SIGMAS: f64 = 0.5;

/// Synthetic ground truth, one label vector per metric, indexed like the table rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TruthVectors {
    labels: Vec<Vec<Label>>,
}

impl TruthVectors {
    pub fn new(labels: Vec<Vec<Label>>) -> Self {
        Self { labels }
    }

    pub fn metric(&self, metric: usize) -> &[Label] {
        &self.labels[metric]
    }
}

#[derive(Debug, Clone)]
pub struct Stage2Output {
    pub table: ObservationTable,
    pub truth: TruthVectors,
    pub injected_rows: Vec<usize>,
}

/// Perturbs ⌊rate·N⌋ rows, shared by every metric, and records them as
/// anomalous. The input table is left untouched.
pub fn inject_anomalies<R: Rng + ?Sized>(
    table: &ObservationTable,
    rate: f64,
    rng: &mut R,
) -> Result<Stage2Output, PipelineError> {
    if !(0.0..=1.0).contains(&rate) {
        return Err(PipelineError::InvalidParameter(format!(
            "injection rate must be in [0, 1]; got {rate}"
        )));
    }
    let n_rows = table.n_rows();
    let n_inject = ((rate * n_rows as f64).floor() as usize).min(n_rows);
    let injected_rows = sample(rng, n_rows, n_inject).into_vec();

    let mut out = table.clone();
    let mut labels = Vec::with_capacity(table.n_metrics());
    for values in out.metrics.iter_mut() {
        let sigma = sample_std(values);
        let noise = if sigma > 0.0 && sigma.is_finite() {
            Normal::new(NOISE_MEAN_SIGMAS * sigma, NOISE_STD_SIGMAS * sigma).ok()
        } else {
            None
        };

        let mut truth = vec![Label::Normal; n_rows];
        for &row in &injected_rows {
            if let Some(dist) = &noise {
                values[row] += dist.sample(rng);
            }
            truth[row] = Label::Anomalous;
        }
        labels.push(truth);
    }

    tracing::info!(
        rows = n_rows,
        injected = injected_rows.len(),
        metrics = table.n_metrics(),
        "injected synthetic anomalies"
    );

    Ok(Stage2Output {
        table: out,
        truth: TruthVectors::new(labels),
        injected_rows,
    })
}

/// Sample standard deviation (n - 1 denominator); 0 below two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let ss = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>();
    (ss / (n - 1) as f64).sqrt()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_inject.rs"]
mod tests;
