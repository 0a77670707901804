use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Missing required columns: {columns:?}")]
    MissingColumns {
        columns: Vec<String>
    },
    #[error("Insufficient data: class [{class}] has {count} rows, at least {required} are required to stratify the split")]
    InsufficientData {
        class: u8,
        count: usize,
        required: usize
    },
    #[error("Insufficient fraud examples to train: minority class has {minority} rows in the training split but oversampling requires at least {required}")]
    ClassImbalance {
        minority: usize,
        required: usize
    },
    #[error("Model [{model}] failed to fit: {reason}")]
    ModelFit {
        model: String,
        reason: String
    },
    #[error("Every candidate model failed to fit")]
    AllModelsFailed,
    #[error("Model [{model}] has not been fitted")]
    NotFitted {
        model: String
    }
}

impl PipelineError {
    pub fn missing_columns(columns: Vec<String>) -> Self {
        Self::MissingColumns { columns }
    }

    pub fn insufficient_data(class: u8, count: usize, required: usize) -> Self {
        Self::InsufficientData { class, count, required }
    }

    pub fn class_imbalance(minority: usize, required: usize) -> Self {
        Self::ClassImbalance { minority, required }
    }

    pub fn model_fit(model: &str, reason: impl Into<String>) -> Self {
        Self::ModelFit {
            model: model.to_string(),
            reason: reason.into(),
        }
    }

    pub fn not_fitted(model: &str) -> Self {
        Self::NotFitted {
            model: model.to_string(),
        }
    }
}
