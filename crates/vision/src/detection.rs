//! Clothing detection.
//!
//! Runs the object detector and keeps only the predictions that name a
//! piece of clothing, normalized into `DetectedItem`s.
//!
//! ## Failure policy
//! Detection is advisory. `detect_clothing` never fails: a model that
//! cannot be loaded or an inference call that errors is logged and yields
//! an empty list. `try_detect_clothing` is the same call but reports a
//! model that could not be loaded, for callers that must know.

use crate::error::ModelError;
use crate::lifecycle::ModelManager;
use crate::types::{BoundingBox, DetectedItem, ImageHandle, RawPrediction};
use catalog::ClothingType;
use std::sync::Arc;
use tracing::{debug, warn};

/// Detector labels treated as clothing (matched case-insensitively)
pub const CLOTHING_CLASSES: [&str; 8] = [
    "shirt", "pants", "shoe", "boot", "hat", "jacket", "dress", "coat",
];

/// Whether a detector label names a clothing class
pub fn is_clothing_label(label: &str) -> bool {
    CLOTHING_CLASSES
        .iter()
        .any(|class| class.eq_ignore_ascii_case(label.trim()))
}

/// Map an accepted detector label to its clothing type.
///
/// Agrees with the `ClothingType` name aliases for every clothing class;
/// any other label is `Unknown`.
pub fn map_clothing_type(label: &str) -> ClothingType {
    match label.trim().to_ascii_lowercase().as_str() {
        "shirt" => ClothingType::Shirt,
        "pants" => ClothingType::Pants,
        "shoe" | "boot" => ClothingType::Shoes,
        "hat" => ClothingType::Accessories,
        "jacket" | "coat" => ClothingType::Jacket,
        "dress" => ClothingType::Dress,
        _ => ClothingType::Unknown,
    }
}

/// Filter and normalize raw predictions, keeping the detector's order
pub fn normalize(predictions: Vec<RawPrediction>) -> Vec<DetectedItem> {
    predictions
        .into_iter()
        .filter(|p| is_clothing_label(&p.label))
        .map(|p| DetectedItem {
            clothing_type: map_clothing_type(&p.label),
            confidence: clamp_unit(p.score),
            bounding_box: BoundingBox::from(p.bbox),
        })
        .collect()
}

pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Clothing detection over the shared object detector
#[derive(Debug, Clone)]
pub struct DetectionPipeline {
    models: Arc<ModelManager>,
}

impl DetectionPipeline {
    pub fn new(models: Arc<ModelManager>) -> Self {
        Self { models }
    }

    /// Detect clothing in an image. Never fails; see module docs.
    pub async fn detect_clothing(&self, image: &ImageHandle) -> Vec<DetectedItem> {
        match self.try_detect_clothing(image).await {
            Ok(items) => items,
            Err(e) => {
                warn!("Clothing detection skipped: {}", e);
                Vec::new()
            }
        }
    }

    /// Detect clothing, reporting a detector that could not be loaded.
    ///
    /// Inference failures still degrade to an empty list.
    pub async fn try_detect_clothing(
        &self,
        image: &ImageHandle,
    ) -> Result<Vec<DetectedItem>, ModelError> {
        let detector = self.models.detection_model().await?;

        let predictions = match detector.detect(image).await {
            Ok(predictions) => predictions,
            Err(e) => {
                warn!("Object detection failed: {}", e);
                return Ok(Vec::new());
            }
        };

        let total = predictions.len();
        let items = normalize(predictions);
        debug!("Detected {} clothing items out of {} predictions", items.len(), total);

        Ok(items)
    }
}
