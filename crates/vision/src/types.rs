//! Detection and pose types.
//!
//! `Raw*` types are what a model hands back; `DetectedItem` and `PoseResult`
//! are the normalized records the rest of the pipeline consumes.

use catalog::ClothingType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Image Handle
// =============================================================================

/// Opaque, cheaply cloneable handle to an encoded image.
///
/// The bytes are passed to the models untouched; decoding happens on the
/// model side.
#[derive(Clone)]
pub struct ImageHandle {
    bytes: Arc<[u8]>,
}

impl ImageHandle {
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self { bytes: bytes.into() }
    }

    /// Read an image file into a handle
    pub async fn open(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("len", &self.bytes.len())
            .finish()
    }
}

// =============================================================================
// Object Detection
// =============================================================================

/// One prediction straight from the object detector
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    /// Free-text class label, e.g. "shoe"
    pub label: String,
    pub score: f32,
    /// `[x, y, width, height]` in image pixels
    pub bbox: [f32; 4],
}

/// Axis-aligned box in image pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x, y, width, height]: [f32; 4]) -> Self {
        Self { x, y, width, height }
    }
}

/// A clothing item found in the image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedItem {
    #[serde(rename = "type")]
    pub clothing_type: ClothingType,
    /// Detector confidence in [0, 1]
    pub confidence: f32,
    pub bounding_box: BoundingBox,
}

// =============================================================================
// Pose Estimation
// =============================================================================

/// Named anatomical landmark, e.g. "left_shoulder"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: String,
    pub x: f32,
    pub y: f32,
    /// Detection confidence in [0, 1]
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(name: impl Into<String>, x: f32, y: f32, confidence: f32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            confidence,
        }
    }
}

/// One pose straight from the pose estimator
#[derive(Debug, Clone, PartialEq)]
pub struct RawPose {
    pub keypoints: Vec<Keypoint>,
    pub score: f32,
}

/// Normalized pose for one detected person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseResult {
    pub keypoints: Vec<Keypoint>,
    /// Overall pose score in [0, 1]
    pub score: f32,
}
