//! # Vision Crate
//!
//! Model lifecycle plus the two detection stages of the outfit pipeline.
//!
//! ## Main Components
//!
//! - **lifecycle**: `ModelCell` / `ModelManager`, lazy single-flight model loading
//! - **models**: Traits a model backend implements
//! - **remote**: gRPC backend talking to the vision inference service
//! - **detection**: Clothing detection (`DetectionPipeline`)
//! - **pose**: Pose estimation (`PosePipeline`)
//!
//! ## Example Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use vision::{DetectionPipeline, ImageHandle, ModelCell, ModelManager, RemoteModelLoader};
//!
//! let timeout = Duration::from_secs(5);
//! let detector = Arc::new(RemoteModelLoader::new("http://localhost:50052", "coco-ssd", timeout));
//! let pose = Arc::new(RemoteModelLoader::new("http://localhost:50052", "movenet-lightning", timeout));
//!
//! let models = Arc::new(ModelManager::new(
//!     ModelCell::new("coco-ssd", detector),
//!     ModelCell::new("movenet-lightning", pose),
//! ));
//!
//! let image = ImageHandle::open("photo.jpg").await?;
//! let items = DetectionPipeline::new(models).detect_clothing(&image).await;
//! ```

pub mod error;
pub mod types;
pub mod models;
pub mod lifecycle;
pub mod remote;
pub mod detection;
pub mod pose;

pub use detection::DetectionPipeline;
pub use error::{InferenceError, ModelError};
pub use lifecycle::{ModelCell, ModelManager, ModelReport, ModelStatus};
pub use models::{ModelLoader, ObjectDetector, PoseEstimator};
pub use pose::PosePipeline;
pub use remote::{RemoteModelLoader, RemoteObjectDetector, RemotePoseEstimator};
pub use types::{BoundingBox, DetectedItem, ImageHandle, Keypoint, PoseResult, RawPose, RawPrediction};
