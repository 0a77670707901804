mod fraud_engine;

pub use fraud_engine::{DatasetInfo, FraudEngine, ModelInfo, PredictionReport, TrainingReport};
