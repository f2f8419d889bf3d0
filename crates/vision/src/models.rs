//! Model traits.
//!
//! A model backend plugs into the pipeline by implementing one of the
//! inference traits plus a `ModelLoader` that produces it. The remote gRPC
//! backend lives in `remote`; tests supply in-process mocks.

use crate::error::{InferenceError, ModelError};
use crate::types::{ImageHandle, RawPose, RawPrediction};
use std::sync::Arc;
use tonic::async_trait;

/// Object detector (the clothing model).
///
/// `Send + Sync` so one loaded detector can serve every concurrent request.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Run detection, returning predictions in the model's own order
    async fn detect(&self, image: &ImageHandle) -> Result<Vec<RawPrediction>, InferenceError>;
}

/// Pose estimator (one pose per detected person)
#[async_trait]
pub trait PoseEstimator: Send + Sync {
    async fn estimate(&self, image: &ImageHandle) -> Result<Vec<RawPose>, InferenceError>;
}

/// Produces a ready model.
///
/// Called by `ModelCell` at most once per load attempt. Loading is
/// expected to be slow; it runs on its own task.
#[async_trait]
pub trait ModelLoader<M: ?Sized + Send + Sync>: Send + Sync {
    async fn load(&self) -> Result<Arc<M>, ModelError>;
}
