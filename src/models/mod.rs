mod decision_tree;
mod gradient_boosting;
mod logistic_regression;
mod random_forest;
#[cfg(test)]
mod tests;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineError;

pub use decision_tree::{DecisionTree, DecisionTreeParams};
pub use gradient_boosting::{GradientBoostingClassifier, GradientBoostingParams};
pub use logistic_regression::{LogisticRegression, LogisticRegressionParams};
pub use random_forest::{RandomForestClassifier, RandomForestParams};

/// Common contract for candidate fraud classifiers.
///
/// Capabilities (class weighting, feature importances) are declared through
/// typed queries so the trainer never has to probe a model's internals to
/// find out what it supports.
pub trait Classifier {
    fn name(&self) -> &'static str;

    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[u8]) -> Result<(), PipelineError>;

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<u8>, PipelineError>;

    /// Whether [`Classifier::set_class_weights`] has any effect on fitting.
    fn supports_class_weights(&self) -> bool {
        false
    }

    /// Per-class fitting weights, indexed by label. Ignored by models that do
    /// not support weighting.
    fn set_class_weights(&mut self, _weights: [f64; 2]) {}

    /// Per-feature importance scores in schema order, when the model exposes
    /// them. `None` means the model has no notion of importance.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

/// The fitted classifier selected by training, in a form that serializes into
/// the persisted model blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FraudClassifier {
    RandomForest(RandomForestClassifier),
    GradientBoosting(GradientBoostingClassifier),
    LogisticRegression(LogisticRegression),
}

impl FraudClassifier {
    pub fn as_classifier(&self) -> &dyn Classifier {
        match self {
            FraudClassifier::RandomForest(model) => model,
            FraudClassifier::GradientBoosting(model) => model,
            FraudClassifier::LogisticRegression(model) => model,
        }
    }

    pub fn as_classifier_mut(&mut self) -> &mut dyn Classifier {
        match self {
            FraudClassifier::RandomForest(model) => model,
            FraudClassifier::GradientBoosting(model) => model,
            FraudClassifier::LogisticRegression(model) => model,
        }
    }

    pub fn name(&self) -> &'static str {
        self.as_classifier().name()
    }

    pub fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<u8>, PipelineError> {
        self.as_classifier().predict(features)
    }

    pub fn feature_importances(&self) -> Option<Vec<f64>> {
        self.as_classifier().feature_importances()
    }
}
