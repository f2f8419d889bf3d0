//! Pose estimation.
//!
//! Same lazy-load-then-infer shape as clothing detection, with the same
//! failure policy. Every pose the estimator returns is kept; normalization
//! only cleans up individual keypoints.

use crate::detection::clamp_unit;
use crate::error::ModelError;
use crate::lifecycle::ModelManager;
use crate::types::{ImageHandle, Keypoint, PoseResult, RawPose};
use std::sync::Arc;
use tracing::{debug, warn};

/// Normalize one raw pose.
///
/// Scores are clamped to [0, 1], names are trimmed and lower-cased, and
/// keypoints with non-finite coordinates are dropped.
pub fn normalize_pose(pose: RawPose) -> PoseResult {
    let keypoints = pose
        .keypoints
        .into_iter()
        .filter(|kp| kp.x.is_finite() && kp.y.is_finite())
        .map(|kp| Keypoint {
            name: kp.name.trim().to_ascii_lowercase(),
            x: kp.x,
            y: kp.y,
            confidence: clamp_unit(kp.confidence),
        })
        .collect();

    PoseResult {
        keypoints,
        score: clamp_unit(pose.score),
    }
}

/// Pose analysis over the shared pose estimator
#[derive(Debug, Clone)]
pub struct PosePipeline {
    models: Arc<ModelManager>,
}

impl PosePipeline {
    pub fn new(models: Arc<ModelManager>) -> Self {
        Self { models }
    }

    /// Estimate poses for every person in the image. Never fails.
    pub async fn analyze_pose(&self, image: &ImageHandle) -> Vec<PoseResult> {
        match self.try_analyze_pose(image).await {
            Ok(poses) => poses,
            Err(e) => {
                warn!("Pose analysis skipped: {}", e);
                Vec::new()
            }
        }
    }

    /// Estimate poses, reporting an estimator that could not be loaded
    pub async fn try_analyze_pose(&self, image: &ImageHandle) -> Result<Vec<PoseResult>, ModelError> {
        let estimator = self.models.pose_model().await?;

        let poses = match estimator.estimate(image).await {
            Ok(poses) => poses,
            Err(e) => {
                warn!("Pose estimation failed: {}", e);
                return Ok(Vec::new());
            }
        };

        debug!("Estimated {} poses", poses.len());
        Ok(poses.into_iter().map(normalize_pose).collect())
    }
}
