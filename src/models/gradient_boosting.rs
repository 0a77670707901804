use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::models::Classifier;
use crate::pipeline::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub min_samples_leaf: usize,
}

impl Default for GradientBoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 3,
            learning_rate: 0.1,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum RegressionNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Shallow regression tree fit to gradient residuals. Leaf values take a
/// Newton step (residual sum over hessian sum), matching second-order
/// boosting behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegressionTree {
    nodes: Vec<RegressionNode>,
    importances: Vec<f64>,
}

struct RegressionSplit {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

impl RegressionTree {
    fn fit(
        features: ArrayView2<'_, f64>,
        residuals: &[f64],
        hessians: &[f64],
        max_depth: usize,
        min_samples_leaf: usize,
    ) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            importances: vec![0.0; features.ncols()],
        };

        let indices: Vec<usize> = (0..features.nrows()).collect();
        tree.build(features, residuals, hessians, indices, 0, max_depth, min_samples_leaf);
        tree
    }

    fn leaf(&mut self, residuals: &[f64], hessians: &[f64], indices: &[usize]) -> usize {
        let residual_sum: f64 = indices.iter().map(|&index| residuals[index]).sum();
        let hessian_sum: f64 = indices.iter().map(|&index| hessians[index]).sum();
        let value = if hessian_sum > 1e-12 { residual_sum / hessian_sum } else { 0.0 };

        self.nodes.push(RegressionNode::Leaf { value });
        self.nodes.len() - 1
    }

    fn best_split(
        &self,
        features: ArrayView2<'_, f64>,
        residuals: &[f64],
        indices: &[usize],
        min_samples_leaf: usize,
    ) -> Option<RegressionSplit> {
        let total_sum: f64 = indices.iter().map(|&index| residuals[index]).sum();
        let total_count = indices.len() as f64;
        let parent_score = total_sum * total_sum / total_count;

        let mut best: Option<RegressionSplit> = None;

        for feature in 0..features.ncols() {
            let mut ordered: Vec<(f64, f64)> = indices
                .iter()
                .map(|&index| (features[[index, feature]], residuals[index]))
                .collect();
            ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;

            for position in 0..ordered.len() - 1 {
                let (value, residual) = ordered[position];
                left_sum += residual;

                let next_value = ordered[position + 1].0;

                if next_value <= value {
                    continue;
                }

                let left_count = (position + 1) as f64;
                let right_count = total_count - left_count;

                if (position + 1) < min_samples_leaf
                    || (indices.len() - position - 1) < min_samples_leaf
                {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                // Variance-reduction gain expressed through sum-of-squares scores.
                let decrease =
                    left_sum * left_sum / left_count + right_sum * right_sum / right_count
                        - parent_score;

                let improves = best
                    .as_ref()
                    .map(|current| decrease > current.decrease)
                    .unwrap_or(decrease > 1e-12);

                if improves {
                    best = Some(RegressionSplit {
                        feature,
                        threshold: (value + next_value) / 2.0,
                        decrease,
                    });
                }
            }
        }

        best
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &mut self,
        features: ArrayView2<'_, f64>,
        residuals: &[f64],
        hessians: &[f64],
        indices: Vec<usize>,
        depth: usize,
        max_depth: usize,
        min_samples_leaf: usize,
    ) -> usize {
        if depth >= max_depth || indices.len() < 2 {
            return self.leaf(residuals, hessians, &indices);
        }

        let Some(split) = self.best_split(features, residuals, &indices, min_samples_leaf) else {
            return self.leaf(residuals, hessians, &indices);
        };

        self.importances[split.feature] += split.decrease;

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&index| features[[index, split.feature]] <= split.threshold);

        let left = self.build(
            features,
            residuals,
            hessians,
            left_indices,
            depth + 1,
            max_depth,
            min_samples_leaf,
        );
        let right = self.build(
            features,
            residuals,
            hessians,
            right_indices,
            depth + 1,
            max_depth,
            min_samples_leaf,
        );

        self.nodes.push(RegressionNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        });
        self.nodes.len() - 1
    }

    fn predict(&self, row: &[f64]) -> f64 {
        let mut position = self.nodes.len().saturating_sub(1);

        loop {
            match &self.nodes[position] {
                RegressionNode::Leaf { value } => return *value,
                RegressionNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    position = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Gradient-boosted trees over the binary logistic loss.
///
/// Deliberately has no class-weight support, mirroring the boosted-tree
/// candidate in the reference trio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    params: GradientBoostingParams,
    base_score: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
    fitted: bool,
}

impl GradientBoostingClassifier {
    pub fn new(params: GradientBoostingParams) -> Self {
        Self {
            params,
            base_score: 0.0,
            trees: Vec::new(),
            n_features: 0,
            fitted: false,
        }
    }

    fn sigmoid(value: f64) -> f64 {
        1.0 / (1.0 + (-value).exp())
    }

    fn raw_scores(&self, features: ArrayView2<'_, f64>) -> Vec<f64> {
        features
            .rows()
            .into_iter()
            .map(|row| {
                let row: Vec<f64> = row.to_vec();
                let boosted: f64 = self.trees.iter().map(|tree| tree.predict(&row)).sum();
                self.base_score + self.params.learning_rate * boosted
            })
            .collect()
    }
}

impl Default for GradientBoostingClassifier {
    fn default() -> Self {
        Self::new(GradientBoostingParams::default())
    }
}

impl Classifier for GradientBoostingClassifier {
    fn name(&self) -> &'static str {
        "GradientBoosting"
    }

    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[u8]) -> Result<(), PipelineError> {
        let rows = features.nrows();

        if rows == 0 || rows != labels.len() {
            return Err(PipelineError::model_fit(
                self.name(),
                format!("feature rows ({rows}) and labels ({}) disagree", labels.len()),
            ));
        }

        let positives = labels.iter().filter(|&&label| label == 1).count();

        if positives == 0 || positives == rows {
            return Err(PipelineError::model_fit(
                self.name(),
                "training labels contain a single class",
            ));
        }

        self.trees.clear();
        self.n_features = features.ncols();

        let prior = positives as f64 / rows as f64;
        self.base_score = (prior / (1.0 - prior)).ln();

        let mut scores = vec![self.base_score; rows];

        for _ in 0..self.params.n_estimators {
            let mut residuals = Vec::with_capacity(rows);
            let mut hessians = Vec::with_capacity(rows);

            for (index, &label) in labels.iter().enumerate() {
                let probability = Self::sigmoid(scores[index]);
                residuals.push(label as f64 - probability);
                hessians.push(probability * (1.0 - probability));
            }

            let tree = RegressionTree::fit(
                features,
                &residuals,
                &hessians,
                self.params.max_depth,
                self.params.min_samples_leaf,
            );

            for (index, score) in scores.iter_mut().enumerate() {
                let row: Vec<f64> = features.row(index).to_vec();
                *score += self.params.learning_rate * tree.predict(&row);
            }

            self.trees.push(tree);
        }

        self.fitted = true;

        Ok(())
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<u8>, PipelineError> {
        if !self.fitted {
            return Err(PipelineError::not_fitted(self.name()));
        }

        Ok(self
            .raw_scores(features)
            .into_iter()
            .map(|score| if Self::sigmoid(score) >= 0.5 { 1 } else { 0 })
            .collect())
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        if !self.fitted {
            return None;
        }

        let mut totals = vec![0.0; self.n_features];

        for tree in &self.trees {
            for (feature, value) in tree.importances.iter().enumerate() {
                totals[feature] += value.max(0.0);
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
