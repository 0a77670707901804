use ndarray::{Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::pipeline::PipelineError;

/// Train/test partition of one preprocessed dataset. Row indices into the
/// original matrix are kept so callers can trace split membership.
#[derive(Debug)]
pub struct SplitData {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Vec<u8>,
    pub y_test: Vec<u8>,
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Seeded stratified split: each class is shuffled and partitioned
/// independently so both splits preserve the fraud/legit ratio.
///
/// Per-class test counts are `round(n * test_size)` clamped to keep at least
/// one member of every class on each side.
pub fn stratified_split(
    features: ArrayView2<'_, f64>,
    labels: &[u8],
    test_size: f64,
    seed: u64,
) -> Result<SplitData, PipelineError> {
    let mut class_indices: [Vec<usize>; 2] = [Vec::new(), Vec::new()];

    for (index, &label) in labels.iter().enumerate() {
        class_indices[label.min(1) as usize].push(index);
    }

    for (class, indices) in class_indices.iter().enumerate() {
        if indices.len() < 2 {
            return Err(PipelineError::insufficient_data(class as u8, indices.len(), 2));
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_indices = Vec::new();
    let mut test_indices = Vec::new();

    // Classes iterate in label order, not map order, to keep splits reproducible.
    for indices in &mut class_indices {
        indices.shuffle(&mut rng);

        let test_count = ((indices.len() as f64 * test_size).round() as usize)
            .clamp(1, indices.len() - 1);
        let split_point = indices.len() - test_count;

        train_indices.extend_from_slice(&indices[..split_point]);
        test_indices.extend_from_slice(&indices[split_point..]);
    }

    Ok(SplitData {
        x_train: features.select(Axis(0), &train_indices),
        x_test: features.select(Axis(0), &test_indices),
        y_train: train_indices.iter().map(|&index| labels[index]).collect(),
        y_test: test_indices.iter().map(|&index| labels[index]).collect(),
        train_indices,
        test_indices,
    })
}
