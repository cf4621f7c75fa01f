//! Inference Adapter
//!
//! Wraps the pretrained detector behind the [`Detector`] trait so the
//! detection service never touches ONNX Runtime directly.

#[cfg(test)]
pub mod mock;
pub mod postprocess;
pub mod preprocess;
pub mod status;
pub mod yolo;

use std::path::Path;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

pub use status::{InferenceStats, ModelMetadata};
pub use yolo::{YoloDetector, YoloParams};

/// Class order the solar model was trained with
pub const DEFAULT_CLASS_NAMES: [&str; 4] = [
    "partial-shading",
    "dust-deposit",
    "short-circuit",
    "bypass-diode",
];

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Failed to load model: {0}")]
    Load(String),

    #[error("Inference failed: {0}")]
    Run(String),

    #[error("Unexpected model output: {0}")]
    Output(String),
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Axis-aligned box in image pixels, `x1,y1` top-left and `x2,y2` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// From YOLO center format
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn intersection_over_union(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }

    pub fn clamp(&self, width: f32, height: f32) -> Self {
        Self::new(
            self.x1.clamp(0.0, width),
            self.y1.clamp(0.0, height),
            self.x2.clamp(0.0, width),
            self.y2.clamp(0.0, height),
        )
    }

    pub fn to_xyxy(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// One box as reported by the model, before any enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub class_index: usize,
    pub class_name: String,
    /// Model probability, 0.0 - 1.0
    pub confidence: f32,
    pub bbox: BoundingBox,
}

// ============================================================================
// DETECTOR TRAIT
// ============================================================================

/// Object detector over decoded images. Implementations are loaded once and
/// shared read-only between requests.
pub trait Detector: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<RawDetection>, InferenceError>;

    fn metadata(&self) -> ModelMetadata;
}

/// Reads class names, one per line, so the indices coming out of the ONNX
/// session can be given meaning. Falls back to the training order when the
/// file does not exist.
pub fn read_class_names(path: &Path) -> std::io::Result<Vec<String>> {
    if !path.exists() {
        tracing::warn!(
            "Class names file {} not found, using default class order",
            path.display()
        );
        return Ok(DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect());
    }

    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_iou_identical_and_disjoint() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert!((a.intersection_over_union(&a) - 1.0).abs() < 1e-6);
        assert_eq!(a.intersection_over_union(&b), 0.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 4.0, 4.0);
        let b = BoundingBox::new(0.0, 0.0, 5.0, 5.0);
        // 16 / 25
        assert!((a.intersection_over_union(&b) - 0.64).abs() < 1e-6);
    }

    #[test]
    fn test_from_center_and_clamp() {
        let bbox = BoundingBox::from_center(5.0, 5.0, 20.0, 4.0);
        assert_eq!(bbox.to_xyxy(), [-5.0, 3.0, 15.0, 7.0]);
        assert_eq!(bbox.clamp(10.0, 10.0).to_xyxy(), [0.0, 3.0, 10.0, 7.0]);
    }

    #[test]
    fn test_read_class_names_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "short-circuit\n\n  dust-deposit  \n").unwrap();

        let names = read_class_names(file.path()).unwrap();
        assert_eq!(names, vec!["short-circuit", "dust-deposit"]);
    }

    #[test]
    fn test_read_class_names_default_when_missing() {
        let names = read_class_names(Path::new("/nonexistent/classes.txt")).unwrap();
        assert_eq!(names.len(), DEFAULT_CLASS_NAMES.len());
        assert_eq!(names[2], "short-circuit");
    }
}
