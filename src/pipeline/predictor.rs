use crate::data::Dataset;
use crate::pipeline::preprocess::Preprocessor;
use crate::pipeline::trainer::TrainedPipeline;
use crate::pipeline::PipelineError;

/// Scores a batch of unlabeled transactions with a previously fitted bundle.
///
/// Reapplies the training-time preprocessing against the bundle's fixed
/// vocabulary and the already-fitted scaler (never refit here), then returns
/// one 0/1 label per input row in input order. Pure function of its inputs.
pub fn predict(dataset: &Dataset, pipeline: &TrainedPipeline) -> Result<Vec<u8>, PipelineError> {
    let features = Preprocessor::transform(dataset, &pipeline.vocabulary)?;
    let scaled = pipeline.scaler.transform(features.view());

    pipeline.model.predict(scaled.view())
}
