use crate::model::label::Label;

/// Confusion counts with `Anomalous` as the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Confusion {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_negatives: usize,
}

impl Confusion {
    pub fn from_labels(truth: &[Label], predicted: &[Label]) -> Self {
        debug_assert_eq!(truth.len(), predicted.len());
        let mut out = Confusion::default();
        for (&t, &p) in truth.iter().zip(predicted) {
            out.record(t, p);
        }
        out
    }

    pub fn record(&mut self, truth: Label, predicted: Label) {
        match (truth.is_anomalous(), predicted.is_anomalous()) {
            (true, true) => self.true_positives += 1,
            (false, true) => self.false_positives += 1,
            (true, false) => self.false_negatives += 1,
            (false, false) => self.true_negatives += 1,
        }
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1(&self) -> f64 {
        ratio(
            2 * self.true_positives,
            2 * self.true_positives + self.false_positives + self.false_negatives,
        )
    }
}

// Zero denominators score 0 instead of failing.
fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

pub fn f1_score(truth: &[Label], predicted: &[Label]) -> f64 {
    Confusion::from_labels(truth, predicted).f1()
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/quality.rs"]
mod tests;
