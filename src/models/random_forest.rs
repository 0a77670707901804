use ndarray::{ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::models::{Classifier, DecisionTree, DecisionTreeParams};
use crate::pipeline::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

/// Bagged ensemble of class-weighted decision trees with sqrt feature
/// subsampling per split; prediction is the majority vote over trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    params: RandomForestParams,
    class_weights: [f64; 2],
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForestClassifier {
    pub fn new(params: RandomForestParams) -> Self {
        Self {
            params,
            class_weights: [1.0, 1.0],
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(RandomForestParams { seed, ..RandomForestParams::default() })
    }
}

impl Classifier for RandomForestClassifier {
    fn name(&self) -> &'static str {
        "RandomForest"
    }

    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[u8]) -> Result<(), PipelineError> {
        let rows = features.nrows();

        if rows == 0 || rows != labels.len() {
            return Err(PipelineError::model_fit(
                self.name(),
                format!("feature rows ({rows}) and labels ({}) disagree", labels.len()),
            ));
        }

        self.trees.clear();
        self.n_features = features.ncols();

        let max_features = (self.n_features as f64).sqrt().round().max(1.0) as usize;
        let mut bootstrap_rng = StdRng::seed_from_u64(self.params.seed);

        for estimator in 0..self.params.n_estimators {
            let bootstrap: Vec<usize> =
                (0..rows).map(|_| bootstrap_rng.gen_range(0..rows)).collect();

            let sample = features.select(Axis(0), &bootstrap);
            let sample_labels: Vec<u8> = bootstrap.iter().map(|&index| labels[index]).collect();

            let mut tree = DecisionTree::new(DecisionTreeParams {
                max_depth: self.params.max_depth,
                min_samples_split: self.params.min_samples_split,
                min_samples_leaf: self.params.min_samples_leaf,
                max_features: Some(max_features),
                seed: self.params.seed.wrapping_add(estimator as u64 + 1),
            });
            tree.set_class_weights(self.class_weights);
            tree.fit(sample.view(), &sample_labels)?;

            self.trees.push(tree);
        }

        Ok(())
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<u8>, PipelineError> {
        if self.trees.is_empty() {
            return Err(PipelineError::not_fitted(self.name()));
        }

        Ok(features
            .rows()
            .into_iter()
            .map(|row| {
                let row: Vec<f64> = row.to_vec();
                let votes: usize = self
                    .trees
                    .iter()
                    .filter(|tree| tree.predict_probability(&row) >= 0.5)
                    .count();

                if votes * 2 >= self.trees.len() { 1 } else { 0 }
            })
            .collect())
    }

    fn supports_class_weights(&self) -> bool {
        true
    }

    fn set_class_weights(&mut self, weights: [f64; 2]) {
        self.class_weights = weights;
    }

    /// Mean impurity-decrease importance across trees, normalized to sum 1.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        if self.trees.is_empty() {
            return None;
        }

        let mut totals = vec![0.0; self.n_features];

        for tree in &self.trees {
            for (feature, value) in tree.raw_importances().iter().enumerate() {
                totals[feature] += value;
            }
        }

        let sum: f64 = totals.iter().sum();

        if sum > 0.0 {
            for value in &mut totals {
                *value /= sum;
            }
        }

        Some(totals)
    }
}
