mod file_store;
mod model_store;

use thiserror::Error;

use crate::pipeline::TrainedPipeline;

pub use file_store::FileArtifactStore;
pub use model_store::ModelStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Artifact mismatch: model blob comes from run [{model_run}] but scaler blob from run [{scaler_run}]")]
    ArtifactMismatch {
        model_run: String,
        scaler_run: String
    },
    #[error("Artifact serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Artifact io error: {0}")]
    Io(#[from] std::io::Error)
}

/// Persistence seam for trained pipeline bundles.
///
/// The pipeline is agnostic to where artifacts live; callers pick the store.
/// Whatever the backing medium, a load must return the model and scaler from
/// the same training run or fail.
pub trait ArtifactStorage: Send + Sync + 'static {
    fn load(&self) -> Result<Option<TrainedPipeline>, StorageError>;
    fn save(&self, pipeline: &TrainedPipeline) -> Result<(), StorageError>;
}
