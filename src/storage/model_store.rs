use std::sync::{Arc, RwLock};

use crate::pipeline::TrainedPipeline;

/// Serving-side holder of the single current pipeline bundle.
///
/// Readers take an `Arc` snapshot of the whole bundle, so a retraining swap
/// can never expose a new model paired with an old scaler; the pair changes
/// atomically or not at all.
#[derive(Default)]
pub struct ModelStore {
    current: RwLock<Option<Arc<TrainedPipeline>>>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<TrainedPipeline>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn swap(&self, pipeline: Arc<TrainedPipeline>) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(pipeline);
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }
}
