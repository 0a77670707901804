use serde::{Deserialize, Serialize};

/// Evaluation metrics computed once on the held-out test split at training
/// time and carried with the persisted model; never recomputed later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub fraud_rate: f64,
    pub total_samples: usize,
    pub fraud_samples: usize,
}

impl MetricsReport {
    pub fn from_predictions(y_true: &[u8], y_pred: &[u8]) -> Self {
        Self {
            accuracy: accuracy(y_true, y_pred),
            precision: precision(y_true, y_pred),
            recall: recall(y_true, y_pred),
            f1_score: f1(y_true, y_pred),
            fraud_rate: mean_label(y_true),
            total_samples: y_true.len(),
            fraud_samples: y_true.iter().filter(|&&label| label == 1).count(),
        }
    }
}

pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }

    let correct = y_true
        .iter()
        .zip(y_pred)
        .filter(|(truth, predicted)| truth == predicted)
        .count();

    correct as f64 / y_true.len() as f64
}

/// Of everything flagged as fraud, the share that actually was. An empty
/// flagged set scores 0.0 rather than dividing by zero.
pub fn precision(y_true: &[u8], y_pred: &[u8]) -> f64 {
    let (true_positives, false_positives, _) = confusion_counts(y_true, y_pred);
    ratio(true_positives, true_positives + false_positives)
}

/// Of all actual fraud, the share that was flagged.
pub fn recall(y_true: &[u8], y_pred: &[u8]) -> f64 {
    let (true_positives, _, false_negatives) = confusion_counts(y_true, y_pred);
    ratio(true_positives, true_positives + false_negatives)
}

/// Harmonic mean of precision and recall; the model-selection criterion.
pub fn f1(y_true: &[u8], y_pred: &[u8]) -> f64 {
    let p = precision(y_true, y_pred);
    let r = recall(y_true, y_pred);

    if p + r == 0.0 {
        0.0
    } else {
        2.0 * p * r / (p + r)
    }
}

fn mean_label(y_true: &[u8]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }

    y_true.iter().map(|&label| label as f64).sum::<f64>() / y_true.len() as f64
}

fn confusion_counts(y_true: &[u8], y_pred: &[u8]) -> (usize, usize, usize) {
    let mut true_positives = 0;
    let mut false_positives = 0;
    let mut false_negatives = 0;

    for (&truth, &predicted) in y_true.iter().zip(y_pred) {
        match (truth, predicted) {
            (1, 1) => true_positives += 1,
            (0, 1) => false_positives += 1,
            (1, 0) => false_negatives += 1,
            _ => {}
        }
    }

    (true_positives, false_positives, false_negatives)
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
