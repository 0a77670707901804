use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::models::FraudClassifier;
use crate::pipeline::{CategoryVocabulary, MetricsReport, StandardScaler, TrainedPipeline};
use crate::storage::{ArtifactStorage, StorageError};

const MODEL_FILE: &str = "model.json";
const SCALER_FILE: &str = "scaler.json";

/// Model half of the persisted pair. The schema and vocabulary travel with
/// the model because predictions are meaningless without them.
#[derive(Serialize, Deserialize)]
struct ModelBlob {
    run_id: Uuid,
    model: FraudClassifier,
    feature_schema: Vec<String>,
    vocabulary: CategoryVocabulary,
    metrics: MetricsReport,
}

/// Scaler half of the persisted pair, stamped with the run that fitted it.
#[derive(Serialize, Deserialize)]
struct ScalerBlob {
    run_id: Uuid,
    scaler: StandardScaler,
}

/// Artifact store writing the model and scaler as two JSON blobs in one
/// directory. Loading refuses a pair whose run ids disagree, so a model can
/// never be served with a scaler from a different training run.
pub struct FileArtifactStore {
    directory: PathBuf,
}

impl FileArtifactStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into() }
    }

    fn model_path(&self) -> PathBuf {
        self.directory.join(MODEL_FILE)
    }

    fn scaler_path(&self) -> PathBuf {
        self.directory.join(SCALER_FILE)
    }

    fn read_blob<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, StorageError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl ArtifactStorage for FileArtifactStore {
    fn load(&self) -> Result<Option<TrainedPipeline>, StorageError> {
        if !self.model_path().exists() || !self.scaler_path().exists() {
            return Ok(None);
        }

        let model_blob: ModelBlob = Self::read_blob(&self.model_path())?;
        let scaler_blob: ScalerBlob = Self::read_blob(&self.scaler_path())?;

        if model_blob.run_id != scaler_blob.run_id {
            return Err(StorageError::ArtifactMismatch {
                model_run: model_blob.run_id.to_string(),
                scaler_run: scaler_blob.run_id.to_string(),
            });
        }

        debug!("Loaded persisted model from run [{}]", model_blob.run_id);

        Ok(Some(TrainedPipeline {
            run_id: model_blob.run_id,
            model: model_blob.model,
            scaler: scaler_blob.scaler,
            feature_schema: model_blob.feature_schema,
            vocabulary: model_blob.vocabulary,
            metrics: model_blob.metrics,
        }))
    }

    fn save(&self, pipeline: &TrainedPipeline) -> Result<(), StorageError> {
        fs::create_dir_all(&self.directory)?;

        let model_blob = ModelBlob {
            run_id: pipeline.run_id,
            model: pipeline.model.clone(),
            feature_schema: pipeline.feature_schema.clone(),
            vocabulary: pipeline.vocabulary.clone(),
            metrics: pipeline.metrics.clone(),
        };
        let scaler_blob = ScalerBlob {
            run_id: pipeline.run_id,
            scaler: pipeline.scaler.clone(),
        };

        fs::write(self.model_path(), serde_json::to_string(&model_blob)?)?;
        fs::write(self.scaler_path(), serde_json::to_string(&scaler_blob)?)?;

        debug!("Persisted model and scaler for run [{}]", pipeline.run_id);

        Ok(())
    }
}
