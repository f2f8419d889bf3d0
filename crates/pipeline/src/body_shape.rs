//! Body shape classification from pose keypoints.
//!
//! ## Algorithm
//! 1. Look up both shoulders and both hips (confidence >= 0.3), plus both
//!    waist points when the pose has them
//! 2. r = shoulder width / hip width
//! 3. r < 0.90 is pear, r > 1.35 is fit, 1.15 < r <= 1.35 is apple
//! 4. Otherwise the frame is balanced and the waist decides:
//!    - with `left_waist`/`right_waist` points: hourglass when
//!      waist / hip < 0.80
//!    - with the standard 17 keypoints (no waist): hourglass when the mean of
//!      shoulder and hip width over torso height (shoulder midpoint to hip
//!      midpoint) is above 0.75, a broad frame over a short torso
//!    - rectangle otherwise
//!
//! Non-finite widths or ratios give `Unknown`.
//!
//! Confidence is the mean confidence of the keypoints used, scaled down as
//! a ratio approaches a threshold. The function is pure: the same keypoints
//! always produce the same result.

use serde::{Deserialize, Serialize};
use std::fmt;
use vision::Keypoint;

/// Keypoints below this confidence are ignored
pub const MIN_KEYPOINT_CONFIDENCE: f32 = 0.3;

const PEAR_BELOW: f32 = 0.90;
const APPLE_ABOVE: f32 = 1.15;
const FIT_ABOVE: f32 = 1.35;
const HOURGLASS_WAIST_BELOW: f32 = 0.80;
const HOURGLASS_FRAME_ABOVE: f32 = 0.75;

/// Ratio distance at which a classification counts as fully certain
const FULL_MARGIN: f32 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyShape {
    Hourglass,
    Pear,
    Apple,
    Rectangle,
    Fit,
    Unknown,
}

impl BodyShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyShape::Hourglass => "hourglass",
            BodyShape::Pear => "pear",
            BodyShape::Apple => "apple",
            BodyShape::Rectangle => "rectangle",
            BodyShape::Fit => "fit",
            BodyShape::Unknown => "unknown",
        }
    }

    /// Style advice for this shape; empty for `Unknown`
    pub fn advice(&self) -> &'static [&'static str] {
        match self {
            BodyShape::Hourglass => &["Fitted styles", "Wrap dresses", "Accentuate waist"],
            BodyShape::Pear => &["A-line bottoms", "Darker bottoms", "Lighter tops"],
            BodyShape::Apple => &["Flow fabrics", "V-necks", "Long cardigans"],
            BodyShape::Rectangle => &["Layering", "Belted styles", "Patterns"],
            BodyShape::Fit => &["Any style works", "Personal preference", "Trendy pieces"],
            BodyShape::Unknown => &[],
        }
    }
}

impl fmt::Display for BodyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyShapeResult {
    pub shape: BodyShape,
    /// In [0, 1]; 0 for `Unknown`
    pub confidence: f32,
    pub recommendations: Vec<String>,
}

impl BodyShapeResult {
    pub fn unknown() -> Self {
        Self {
            shape: BodyShape::Unknown,
            confidence: 0.0,
            recommendations: Vec::new(),
        }
    }

    fn classified(shape: BodyShape, confidence: f32) -> Self {
        Self {
            shape,
            confidence: confidence.clamp(0.0, 1.0),
            recommendations: shape.advice().iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Classify body shape from one pose's keypoints.
///
/// Missing shoulders or hips (including an empty slice) is not an error:
/// the result is `Unknown` with zero confidence and no advice.
pub fn classify_body_shape(keypoints: &[Keypoint]) -> BodyShapeResult {
    let (Some(shoulders), Some(hips)) = (
        pair(keypoints, "left_shoulder", "right_shoulder"),
        pair(keypoints, "left_hip", "right_hip"),
    ) else {
        return BodyShapeResult::unknown();
    };

    let hip_width = width(hips);
    if hip_width <= f32::EPSILON {
        return BodyShapeResult::unknown();
    }

    let ratio = width(shoulders) / hip_width;
    let waist = pair(keypoints, "left_waist", "right_waist");
    let waist_ratio = waist.map(|w| width(w) / hip_width);
    let frame = match waist {
        Some(_) => None,
        None => frame_ratio(shoulders, hips),
    };
    if !ratio.is_finite()
        || waist_ratio.is_some_and(|w| !w.is_finite())
        || frame.is_some_and(|f| !f.is_finite())
    {
        return BodyShapeResult::unknown();
    }

    let shape = if ratio < PEAR_BELOW {
        BodyShape::Pear
    } else if ratio > FIT_ABOVE {
        BodyShape::Fit
    } else if ratio > APPLE_ABOVE {
        BodyShape::Apple
    } else if waist_ratio.is_some_and(|w| w < HOURGLASS_WAIST_BELOW)
        || frame.is_some_and(|f| f > HOURGLASS_FRAME_ABOVE)
    {
        BodyShape::Hourglass
    } else {
        BodyShape::Rectangle
    };

    let mut distance = [PEAR_BELOW, APPLE_ABOVE, FIT_ABOVE]
        .iter()
        .map(|t| (ratio - t).abs())
        .fold(f32::INFINITY, f32::min);
    if matches!(shape, BodyShape::Hourglass | BodyShape::Rectangle) {
        if let Some(w) = waist_ratio {
            distance = distance.min((w - HOURGLASS_WAIST_BELOW).abs());
        }
        if let Some(f) = frame {
            distance = distance.min((f - HOURGLASS_FRAME_ABOVE).abs());
        }
    }
    let margin = (distance / FULL_MARGIN).min(1.0);

    let mut used = vec![shoulders.0, shoulders.1, hips.0, hips.1];
    if let Some((left, right)) = waist {
        used.extend([left, right]);
    }
    let mean = used.iter().map(|kp| kp.confidence).sum::<f32>() / used.len() as f32;

    BodyShapeResult::classified(shape, mean * (0.5 + 0.5 * margin))
}

/// First confident keypoint with this name
fn find<'a>(keypoints: &'a [Keypoint], name: &str) -> Option<&'a Keypoint> {
    keypoints
        .iter()
        .find(|kp| kp.name == name && kp.confidence >= MIN_KEYPOINT_CONFIDENCE)
}

fn pair<'a>(
    keypoints: &'a [Keypoint],
    left: &str,
    right: &str,
) -> Option<(&'a Keypoint, &'a Keypoint)> {
    Some((find(keypoints, left)?, find(keypoints, right)?))
}

fn width((a, b): (&Keypoint, &Keypoint)) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Mean of shoulder and hip width over torso height; `None` for a
/// degenerate torso
fn frame_ratio(shoulders: (&Keypoint, &Keypoint), hips: (&Keypoint, &Keypoint)) -> Option<f32> {
    let mid = |(a, b): (&Keypoint, &Keypoint)| ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
    let (sx, sy) = mid(shoulders);
    let (hx, hy) = mid(hips);
    let torso = (sx - hx).hypot(sy - hy);
    if torso <= f32::EPSILON {
        return None;
    }
    Some((width(shoulders) + width(hips)) / 2.0 / torso)
}
