mod csv_reader;
mod dataset;

pub use csv_reader::read_csv_dataset;
pub use dataset::{CellValue, Column, Dataset};

/// Column holding the 0/1 ground-truth fraud label in training data.
pub const LABEL_COLUMN: &str = "Fraud Flag or Label";

/// Feature columns the pipeline consumes, in canonical schema order.
///
/// The order here is the feature schema: both training and inference select
/// these columns in this exact order regardless of how the input was laid out.
pub const FEATURE_COLUMNS: [&str; 5] = [
    "Transaction Amount",
    "Merchant Category Code (MCC)",
    "Transaction Response Code",
    "Card Type",
    "Transaction Source",
];

/// The two free-text categorical feature columns that get vocabulary encoding.
pub const CATEGORICAL_COLUMNS: [&str; 2] = ["Card Type", "Transaction Source"];
