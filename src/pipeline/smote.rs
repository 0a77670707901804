use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::pipeline::PipelineError;

/// Neighbor count used when interpolating synthetic minority rows.
pub const SMOTE_NEIGHBORS: usize = 5;

/// Synthetic minority oversampling over an already-scaled training split.
///
/// New minority rows are interpolated between an existing minority row and one
/// of its nearest minority neighbors until both classes have equal counts.
/// Applies to the training split only; the held-out split is never resampled.
pub fn smote_resample(
    features: ArrayView2<'_, f64>,
    labels: &[u8],
    seed: u64,
) -> Result<(Array2<f64>, Vec<u8>), PipelineError> {
    let minority_class = minority_class(labels);
    let minority_indices: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, &label)| label == minority_class)
        .map(|(index, _)| index)
        .collect();
    let majority_count = labels.len() - minority_indices.len();
    let minority_count = minority_indices.len();

    if minority_count == majority_count {
        return Ok((features.to_owned(), labels.to_vec()));
    }

    if minority_count < SMOTE_NEIGHBORS + 1 {
        return Err(PipelineError::class_imbalance(minority_count, SMOTE_NEIGHBORS + 1));
    }

    let needed = majority_count - minority_count;
    let neighbors = nearest_minority_neighbors(features, &minority_indices);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut resampled = features.to_owned();
    let mut labels = labels.to_vec();

    for _ in 0..needed {
        let pick = rng.gen_range(0..minority_count);
        let base = features.row(minority_indices[pick]);
        let neighbor_pick = rng.gen_range(0..SMOTE_NEIGHBORS.min(neighbors[pick].len()));
        let neighbor = features.row(minority_indices[neighbors[pick][neighbor_pick]]);
        let gap: f64 = rng.gen();

        let synthetic: Vec<f64> = base
            .iter()
            .zip(neighbor.iter())
            .map(|(a, b)| a + gap * (b - a))
            .collect();

        resampled
            .push_row(ArrayView1::from(synthetic.as_slice()))
            .map_err(|error| PipelineError::model_fit("SMOTE", error.to_string()))?;
        labels.push(minority_class);
    }

    debug_assert_eq!(resampled.len_of(Axis(0)), labels.len());

    Ok((resampled, labels))
}

fn minority_class(labels: &[u8]) -> u8 {
    let positives = labels.iter().filter(|&&label| label == 1).count();

    if positives * 2 <= labels.len() { 1 } else { 0 }
}

/// Index (into the minority list) of each minority row's nearest minority
/// neighbors, by euclidean distance, self excluded. Ties break on row index
/// so the ordering is stable across runs.
fn nearest_minority_neighbors(
    features: ArrayView2<'_, f64>,
    minority_indices: &[usize],
) -> Vec<Vec<usize>> {
    minority_indices
        .iter()
        .enumerate()
        .map(|(position, &row_index)| {
            let row = features.row(row_index);

            let mut distances: Vec<(f64, usize)> = minority_indices
                .iter()
                .enumerate()
                .filter(|(other_position, _)| *other_position != position)
                .map(|(other_position, &other_index)| {
                    let other = features.row(other_index);
                    let distance = row
                        .iter()
                        .zip(other.iter())
                        .map(|(a, b)| (a - b).powi(2))
                        .sum::<f64>();
                    (distance, other_position)
                })
                .collect();

            distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            distances
                .into_iter()
                .take(SMOTE_NEIGHBORS)
                .map(|(_, other_position)| other_position)
                .collect()
        })
        .collect()
}
