use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Per-feature standardization (zero mean, unit variance).
///
/// Fitted on the training split only and carried inside the persisted
/// artifact; inference re-applies the stored parameters and never refits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fits mean and population standard deviation per feature. Constant
    /// features keep a scale of 1.0 so they pass through unchanged.
    pub fn fit(features: ArrayView2<'_, f64>) -> Self {
        let rows = features.nrows().max(1) as f64;

        let mean: Vec<f64> = features
            .axis_iter(Axis(1))
            .map(|column| column.sum() / rows)
            .collect();

        let scale: Vec<f64> = features
            .axis_iter(Axis(1))
            .zip(&mean)
            .map(|(column, mean)| {
                let variance = column.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / rows;
                let std = variance.sqrt();
                if std > 0.0 { std } else { 1.0 }
            })
            .collect();

        Self { mean, scale }
    }

    pub fn transform(&self, features: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut scaled = features.to_owned();

        for (column_index, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
            let mean = self.mean[column_index];
            let scale = self.scale[column_index];

            column.mapv_inplace(|value| (value - mean) / scale);
        }

        scaled
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}
