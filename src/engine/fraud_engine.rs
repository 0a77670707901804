use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use serde::Serialize;
use tokio::task::spawn_blocking;
use tracing::info;

use crate::data::{read_csv_dataset, Dataset};
use crate::pipeline::{self, MetricsReport, TrainedPipeline};
use crate::storage::{ArtifactStorage, ModelStore};

/// Summary of the dataset a model was trained from.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetInfo {
    pub total_rows: usize,
    pub fraud_count: usize,
    pub fraud_percentage: f64,
}

/// Caller-facing result of one training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub metrics: MetricsReport,
    pub dataset_info: DatasetInfo,
}

/// Caller-facing result of one prediction batch.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub predictions: Vec<u8>,
    pub total_transactions: usize,
    pub fraud_count: usize,
    pub fraud_percentage: f64,
}

/// Description of the currently loaded model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub run_id: String,
    pub metrics: MetricsReport,
}

/// Orchestrates the training and prediction pipeline around an artifact store.
///
/// The pipeline itself is synchronous and CPU-bound, so both CSV ingestion
/// and training run on blocking worker threads, keeping the async caller
/// (a request handler, typically) unblocked. On success the freshly trained
/// bundle is persisted and swapped into the in-memory store as one unit.
pub struct FraudEngine<S: ArtifactStorage> {
    storage: Arc<S>,
    store: ModelStore,
}

impl<S: ArtifactStorage> FraudEngine<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            store: ModelStore::new(),
        }
    }

    /// Trains from a labeled CSV, persists the bundle and makes it current.
    pub async fn train_from_csv(&self, path: &Path) -> anyhow::Result<TrainingReport> {
        let dataset = load_dataset(path.to_path_buf()).await?;

        let dataset_info = DatasetInfo {
            total_rows: dataset.rows(),
            fraud_count: dataset.fraud_count(),
            fraud_percentage: dataset.fraud_percentage(),
        };

        info!(
            "Training model from {} ({} rows, {} fraud)",
            path.display(),
            dataset_info.total_rows,
            dataset_info.fraud_count
        );

        let pipeline = spawn_blocking(move || pipeline::train(&dataset))
            .await
            .map_err(|error| anyhow!("Training task failed: {error}"))??;

        self.storage
            .save(&pipeline)
            .context("Persisting trained artifacts")?;

        let metrics = pipeline.metrics.clone();
        self.store.swap(Arc::new(pipeline));

        info!("Model training completed (F1 {:.4})", metrics.f1_score);

        Ok(TrainingReport { metrics, dataset_info })
    }

    /// Predicts fraud labels for an unlabeled CSV of transactions.
    pub async fn predict_from_csv(&self, path: &Path) -> anyhow::Result<PredictionReport> {
        let dataset = load_dataset(path.to_path_buf()).await?;
        self.predict_dataset(&dataset)
    }

    /// Predicts fraud labels for an in-memory batch (e.g. parsed JSON records).
    pub fn predict_dataset(&self, dataset: &Dataset) -> anyhow::Result<PredictionReport> {
        let pipeline = self.current_pipeline()?;
        let predictions = pipeline::predict(dataset, &pipeline)?;

        let fraud_count = predictions.iter().filter(|&&label| label == 1).count();
        let total_transactions = predictions.len();
        let fraud_percentage = if total_transactions > 0 {
            fraud_count as f64 / total_transactions as f64 * 100.0
        } else {
            0.0
        };

        Ok(PredictionReport {
            predictions,
            total_transactions,
            fraud_count,
            fraud_percentage,
        })
    }

    /// Information about the model that would serve predictions right now.
    pub fn info(&self) -> anyhow::Result<Option<ModelInfo>> {
        if !self.store.is_loaded() {
            if let Some(pipeline) = self.storage.load()? {
                self.store.swap(Arc::new(pipeline));
            }
        }

        Ok(self.store.current().map(|pipeline| ModelInfo {
            model_type: pipeline.model.name().to_string(),
            run_id: pipeline.run_id.to_string(),
            metrics: pipeline.metrics.clone(),
        }))
    }

    /// Resident bundle, falling back to persisted artifacts on first use.
    fn current_pipeline(&self) -> anyhow::Result<Arc<TrainedPipeline>> {
        if let Some(pipeline) = self.store.current() {
            return Ok(pipeline);
        }

        if let Some(pipeline) = self.storage.load()? {
            let pipeline = Arc::new(pipeline);
            self.store.swap(pipeline.clone());
            return Ok(pipeline);
        }

        Err(anyhow!("Model not trained yet. Train a model before predicting."))
    }
}

async fn load_dataset(path: PathBuf) -> anyhow::Result<Dataset> {
    spawn_blocking(move || read_csv_dataset(&path))
        .await
        .map_err(|error| anyhow!("CSV ingestion task failed: {error}"))?
}
