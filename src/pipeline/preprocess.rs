use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::data::{CellValue, Dataset, CATEGORICAL_COLUMNS, FEATURE_COLUMNS, LABEL_COLUMN};
use crate::pipeline::PipelineError;

/// Integer code assigned to categorical values never seen at training time.
///
/// Kept below the first-seen codes `0..n` so a fresh category can never
/// collide with one from the training vocabulary.
pub const UNKNOWN_CATEGORY_CODE: f64 = -1.0;

/// Ordered category vocabularies fixed at training time.
///
/// Codes are positions in first-seen order over the training batch. Inference
/// encodes against this fixed vocabulary instead of re-deriving codes from the
/// incoming batch, so a prediction batch with a different category mix cannot
/// silently shift the encoding of the features the model was fitted on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    vocabularies: Vec<(String, Vec<String>)>,
}

impl CategoryVocabulary {
    fn entry(&mut self, column: &str) -> &mut Vec<String> {
        if let Some(position) = self.vocabularies.iter().position(|(name, _)| name == column) {
            return &mut self.vocabularies[position].1;
        }

        self.vocabularies.push((column.to_string(), Vec::new()));
        let last = self.vocabularies.len() - 1;
        &mut self.vocabularies[last].1
    }

    fn observe(&mut self, column: &str, value: &str) -> f64 {
        let values = self.entry(column);

        match values.iter().position(|known| known == value) {
            Some(code) => code as f64,
            None => {
                values.push(value.to_string());
                (values.len() - 1) as f64
            }
        }
    }

    fn lookup(&self, column: &str, value: &str) -> f64 {
        self.vocabularies
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, values)| values.iter().position(|known| known == value))
            .map(|code| code as f64)
            .unwrap_or(UNKNOWN_CATEGORY_CODE)
    }

    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.vocabularies
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, values)| values.as_slice())
    }
}

/// Output of a training-time preprocessing pass.
#[derive(Debug)]
pub struct PreprocessedTrainingData {
    pub features: Array2<f64>,
    pub schema: Vec<String>,
    pub vocabulary: CategoryVocabulary,
    pub labels: Vec<u8>,
}

/// Deterministic transformation from raw tabular records to the fixed numeric
/// feature matrix. Stateless; the resolved schema and vocabulary are returned
/// to the caller rather than held here.
pub struct Preprocessor;

impl Preprocessor {
    /// Validates the training schema, builds the categorical vocabulary and
    /// returns the feature matrix together with the label vector.
    pub fn fit_transform(dataset: &Dataset) -> Result<PreprocessedTrainingData, PipelineError> {
        Self::check_required_columns(dataset, true)?;

        let mut vocabulary = CategoryVocabulary::default();
        let features = Self::encode_features(dataset, &mut vocabulary, None);
        let labels = Self::extract_labels(dataset);

        Ok(PreprocessedTrainingData {
            features,
            schema: Self::schema(),
            vocabulary,
            labels,
        })
    }

    /// Re-applies the training-time field selection and encoding to an
    /// unlabeled batch, encoding categoricals against the fixed vocabulary.
    pub fn transform(
        dataset: &Dataset,
        vocabulary: &CategoryVocabulary,
    ) -> Result<Array2<f64>, PipelineError> {
        Self::check_required_columns(dataset, false)?;

        let mut scratch = CategoryVocabulary::default();
        Ok(Self::encode_features(dataset, &mut scratch, Some(vocabulary)))
    }

    /// The fixed, ordered feature schema. Independent of input column order by
    /// construction: features are always selected in canonical order.
    pub fn schema() -> Vec<String> {
        FEATURE_COLUMNS.iter().map(|name| name.to_string()).collect()
    }

    fn check_required_columns(dataset: &Dataset, with_label: bool) -> Result<(), PipelineError> {
        let mut missing: Vec<String> = FEATURE_COLUMNS
            .iter()
            .filter(|name| !dataset.has_column(name))
            .map(|name| name.to_string())
            .collect();

        if with_label && !dataset.has_column(LABEL_COLUMN) {
            missing.push(LABEL_COLUMN.to_string());
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::missing_columns(missing))
        }
    }

    fn encode_features(
        dataset: &Dataset,
        vocabulary: &mut CategoryVocabulary,
        fixed: Option<&CategoryVocabulary>,
    ) -> Array2<f64> {
        let rows = dataset.rows();
        let mut values = Vec::with_capacity(rows * FEATURE_COLUMNS.len());

        for row in 0..rows {
            for name in FEATURE_COLUMNS {
                let cell = &dataset
                    .column(name)
                    .map(|column| column.cells[row].clone())
                    .unwrap_or(CellValue::Missing);

                let encoded = if CATEGORICAL_COLUMNS.contains(&name) {
                    let category = Self::categorical_text(cell);
                    match fixed {
                        Some(vocabulary) => vocabulary.lookup(name, &category),
                        None => vocabulary.observe(name, &category),
                    }
                } else {
                    Self::numeric_value(cell)
                };

                values.push(encoded);
            }
        }

        Array2::from_shape_vec((rows, FEATURE_COLUMNS.len()), values)
            .unwrap_or_else(|_| Array2::zeros((0, FEATURE_COLUMNS.len())))
    }

    // Missing cells fill with zero before encoding, so an absent category
    // becomes the literal category "0" rather than a missing marker.
    fn categorical_text(cell: &CellValue) -> String {
        match cell {
            CellValue::Text(text) => text.clone(),
            CellValue::Number(value) => {
                if value.fract() == 0.0 {
                    format!("{}", *value as i64)
                } else {
                    format!("{value}")
                }
            }
            CellValue::Missing => "0".to_string(),
        }
    }

    fn numeric_value(cell: &CellValue) -> f64 {
        match cell {
            CellValue::Number(value) => *value,
            CellValue::Text(text) => text.trim().parse::<f64>().unwrap_or(0.0),
            CellValue::Missing => 0.0,
        }
    }

    fn extract_labels(dataset: &Dataset) -> Vec<u8> {
        let Some(column) = dataset.column(LABEL_COLUMN) else {
            return Vec::new();
        };

        column
            .cells
            .iter()
            .map(|cell| if Self::numeric_value(cell) != 0.0 { 1 } else { 0 })
            .collect()
    }
}
