mod errors;
mod importance;
mod metrics;
mod predictor;
mod preprocess;
mod scale;
mod smote;
mod split;
#[cfg(test)]
mod tests;
mod trainer;

pub use errors::PipelineError;
pub use importance::ranked_importances;
pub use metrics::MetricsReport;
pub use predictor::predict;
pub use preprocess::{
    CategoryVocabulary, PreprocessedTrainingData, Preprocessor, UNKNOWN_CATEGORY_CODE,
};
pub use scale::StandardScaler;
pub use smote::{smote_resample, SMOTE_NEIGHBORS};
pub use split::{stratified_split, SplitData};
pub use trainer::{train, TrainedPipeline, RANDOM_SEED, TEST_SIZE};
