use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::models::Classifier;
use crate::pipeline::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegressionParams {
    pub max_iter: usize,
    pub learning_rate: f64,
    /// L2 penalty strength applied to the weights (not the intercept).
    pub l2_penalty: f64,
    /// Stop early once the gradient norm falls below this.
    pub tolerance: f64,
}

impl Default for LogisticRegressionParams {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            learning_rate: 0.1,
            l2_penalty: 1.0,
            tolerance: 1e-6,
        }
    }
}

/// L2-regularized logistic regression fit by batch gradient descent.
///
/// Expects standardized inputs; the trainer always feeds it scaled features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    params: LogisticRegressionParams,
    class_weights: [f64; 2],
    weights: Vec<f64>,
    intercept: f64,
    fitted: bool,
}

impl LogisticRegression {
    pub fn new(params: LogisticRegressionParams) -> Self {
        Self {
            params,
            class_weights: [1.0, 1.0],
            weights: Vec::new(),
            intercept: 0.0,
            fitted: false,
        }
    }

    fn sigmoid(value: f64) -> f64 {
        1.0 / (1.0 + (-value).exp())
    }

    fn decision(&self, row: &[f64]) -> f64 {
        let linear: f64 = self
            .weights
            .iter()
            .zip(row)
            .map(|(weight, value)| weight * value)
            .sum();
        linear + self.intercept
    }

    /// Fitted coefficient magnitudes; the linear model's importance signal.
    pub fn coefficients(&self) -> &[f64] {
        &self.weights
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(LogisticRegressionParams::default())
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &'static str {
        "LogisticRegression"
    }

    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[u8]) -> Result<(), PipelineError> {
        let rows = features.nrows();

        if rows == 0 || rows != labels.len() {
            return Err(PipelineError::model_fit(
                self.name(),
                format!("feature rows ({rows}) and labels ({}) disagree", labels.len()),
            ));
        }

        let columns = features.ncols();
        self.weights = vec![0.0; columns];
        self.intercept = 0.0;

        let sample_weights: Vec<f64> = labels
            .iter()
            .map(|&label| self.class_weights[label.min(1) as usize])
            .collect();
        let weight_total: f64 = sample_weights.iter().sum();

        for _ in 0..self.params.max_iter {
            let mut gradient = vec![0.0; columns];
            let mut intercept_gradient = 0.0;

            for (index, &label) in labels.iter().enumerate() {
                let row: Vec<f64> = features.row(index).to_vec();
                let error = Self::sigmoid(self.decision(&row)) - label as f64;
                let weighted_error = error * sample_weights[index];

                for (slot, value) in gradient.iter_mut().zip(&row) {
                    *slot += weighted_error * value;
                }

                intercept_gradient += weighted_error;
            }

            intercept_gradient /= weight_total;

            let mut gradient_norm = intercept_gradient * intercept_gradient;

            for (slot, weight) in gradient.iter_mut().zip(&self.weights) {
                *slot = *slot / weight_total + self.params.l2_penalty * weight / weight_total;
                gradient_norm += *slot * *slot;
            }

            for (weight, slot) in self.weights.iter_mut().zip(&gradient) {
                *weight -= self.params.learning_rate * slot;
            }

            self.intercept -= self.params.learning_rate * intercept_gradient;

            if gradient_norm.sqrt() < self.params.tolerance {
                break;
            }
        }

        self.fitted = true;

        Ok(())
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<u8>, PipelineError> {
        if !self.fitted {
            return Err(PipelineError::not_fitted(self.name()));
        }

        Ok(features
            .rows()
            .into_iter()
            .map(|row| {
                let row: Vec<f64> = row.to_vec();
                if Self::sigmoid(self.decision(&row)) >= 0.5 { 1 } else { 0 }
            })
            .collect())
    }

    fn supports_class_weights(&self) -> bool {
        true
    }

    fn set_class_weights(&mut self, weights: [f64; 2]) {
        self.class_weights = weights;
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        if !self.fitted {
            return None;
        }

        Some(self.weights.iter().map(|weight| weight.abs()).collect())
    }
}
