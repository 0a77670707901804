use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::models::Classifier;
use crate::pipeline::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features sampled per split; `None` considers every feature.
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for DecisionTreeParams {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

/// Arena-allocated tree node; children address back into the node list so the
/// whole tree serializes flat.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        probability: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Binary classification tree using class-weighted gini impurity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    params: DecisionTreeParams,
    class_weights: [f64; 2],
    nodes: Vec<TreeNode>,
    importances: Vec<f64>,
    total_weight: f64,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

impl DecisionTree {
    pub fn new(params: DecisionTreeParams) -> Self {
        Self {
            params,
            class_weights: [1.0, 1.0],
            nodes: Vec::new(),
            importances: Vec::new(),
            total_weight: 0.0,
        }
    }

    fn weight(&self, label: u8) -> f64 {
        self.class_weights[label.min(1) as usize]
    }

    fn weighted_counts(&self, labels: &[u8], indices: &[usize]) -> [f64; 2] {
        let mut counts = [0.0, 0.0];

        for &index in indices {
            counts[labels[index].min(1) as usize] += self.weight(labels[index]);
        }

        counts
    }

    fn gini(counts: &[f64; 2]) -> f64 {
        let total = counts[0] + counts[1];

        if total <= 0.0 {
            return 0.0;
        }

        let p0 = counts[0] / total;
        let p1 = counts[1] / total;
        1.0 - p0 * p0 - p1 * p1
    }

    fn leaf(&mut self, labels: &[u8], indices: &[usize]) -> usize {
        let counts = self.weighted_counts(labels, indices);
        let total = counts[0] + counts[1];
        let probability = if total > 0.0 { counts[1] / total } else { 0.0 };

        self.nodes.push(TreeNode::Leaf { probability });
        self.nodes.len() - 1
    }

    fn best_split(
        &self,
        features: ArrayView2<'_, f64>,
        labels: &[u8],
        indices: &[usize],
        candidate_features: &[usize],
    ) -> Option<BestSplit> {
        let parent_counts = self.weighted_counts(labels, indices);
        let parent_weight = parent_counts[0] + parent_counts[1];
        let parent_gini = Self::gini(&parent_counts);

        let mut best: Option<BestSplit> = None;

        for &feature in candidate_features {
            let mut ordered: Vec<(f64, u8)> = indices
                .iter()
                .map(|&index| (features[[index, feature]], labels[index]))
                .collect();
            ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_counts = [0.0, 0.0];
            let mut right_counts = parent_counts;

            for position in 0..ordered.len() - 1 {
                let (value, label) = ordered[position];
                let weight = self.weight(label);
                left_counts[label.min(1) as usize] += weight;
                right_counts[label.min(1) as usize] -= weight;

                let next_value = ordered[position + 1].0;

                if next_value <= value {
                    continue;
                }

                let left_size = position + 1;
                let right_size = ordered.len() - left_size;

                if left_size < self.params.min_samples_leaf
                    || right_size < self.params.min_samples_leaf
                {
                    continue;
                }

                let left_weight = left_counts[0] + left_counts[1];
                let right_weight = right_counts[0] + right_counts[1];
                let weighted_child_gini = (left_weight * Self::gini(&left_counts)
                    + right_weight * Self::gini(&right_counts))
                    / parent_weight;
                let decrease = parent_gini - weighted_child_gini;

                let improves = best
                    .as_ref()
                    .map(|current| decrease > current.decrease)
                    .unwrap_or(decrease > 1e-12);

                if improves {
                    best = Some(BestSplit {
                        feature,
                        threshold: (value + next_value) / 2.0,
                        decrease,
                    });
                }
            }
        }

        best
    }

    fn build(
        &mut self,
        features: ArrayView2<'_, f64>,
        labels: &[u8],
        indices: Vec<usize>,
        depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let counts = self.weighted_counts(labels, &indices);
        let pure = counts[0] == 0.0 || counts[1] == 0.0;

        if pure || depth >= self.params.max_depth || indices.len() < self.params.min_samples_split {
            return self.leaf(labels, &indices);
        }

        let feature_count = features.ncols();
        let mut candidate_features: Vec<usize> = (0..feature_count).collect();

        if let Some(max_features) = self.params.max_features {
            if max_features < feature_count {
                candidate_features.shuffle(rng);
                candidate_features.truncate(max_features);
                candidate_features.sort_unstable();
            }
        }

        let Some(split) = self.best_split(features, labels, &indices, &candidate_features) else {
            return self.leaf(labels, &indices);
        };

        let node_weight = counts[0] + counts[1];
        self.importances[split.feature] += node_weight / self.total_weight * split.decrease;

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&index| features[[index, split.feature]] <= split.threshold);

        let left = self.build(features, labels, left_indices, depth + 1, rng);
        let right = self.build(features, labels, right_indices, depth + 1, rng);

        self.nodes.push(TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        });
        self.nodes.len() - 1
    }

    /// Weighted fraud probability for one feature row.
    pub fn predict_probability(&self, row: &[f64]) -> f64 {
        let mut position = self.nodes.len().saturating_sub(1);

        loop {
            match &self.nodes[position] {
                TreeNode::Leaf { probability } => return *probability,
                TreeNode::Split {
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

    /// Raw (unnormalized) impurity-decrease totals per feature.
    pub fn raw_importances(&self) -> &[f64] {
        &self.importances
    }
}

impl Classifier for DecisionTree {
    fn name(&self) -> &'static str {
        "DecisionTree"
    }

    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[u8]) -> Result<(), PipelineError> {
        if features.nrows() == 0 || features.nrows() != labels.len() {
            return Err(PipelineError::model_fit(
                self.name(),
                format!(
                    "feature rows ({}) and labels ({}) disagree",
                    features.nrows(),
                    labels.len()
                ),
            ));
        }

        self.nodes.clear();
        self.importances = vec![0.0; features.ncols()];
        let total_weight: f64 = labels.iter().map(|&label| self.weight(label)).sum();
        self.total_weight = total_weight;

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let indices: Vec<usize> = (0..features.nrows()).collect();
        let root = self.build(features, labels, indices, 0, &mut rng);

        // The root is always the last node pushed; predict relies on that.
        debug_assert_eq!(root, self.nodes.len() - 1);

        Ok(())
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<u8>, PipelineError> {
        if self.nodes.is_empty() {
            return Err(PipelineError::not_fitted(self.name()));
        }

        Ok(features
            .rows()
            .into_iter()
            .map(|row| {
                let row: Vec<f64> = row.to_vec();
                if self.predict_probability(&row) >= 0.5 { 1 } else { 0 }
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
        let total: f64 = self.importances.iter().sum();

        if self.importances.is_empty() {
            return None;
        }

        if total > 0.0 {
            Some(self.importances.iter().map(|value| value / total).collect())
        } else {
            Some(self.importances.clone())
        }
    }
}
