//! Test doubles for the detector

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use super::{BoundingBox, Detector, InferenceError, ModelMetadata, RawDetection};

/// Returns the same detections for every image and counts calls.
pub struct StaticDetector {
    detections: Vec<RawDetection>,
    fail: bool,
    calls: AtomicUsize,
}

impl StaticDetector {
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self {
            detections,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(vec![])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Detector for StaticDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<RawDetection>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(InferenceError::Run("session exploded".to_string()));
        }
        Ok(self.detections.clone())
    }

    fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            model_path: "static".to_string(),
            model_type: "static".to_string(),
            input_size: 640,
            classes: self.detections.iter().map(|d| d.class_name.clone()).collect(),
            sha256: None,
            loaded_at: chrono::Utc::now(),
        }
    }
}

pub fn raw(class_name: &str, confidence: f32) -> RawDetection {
    RawDetection {
        class_index: 0,
        class_name: class_name.to_string(),
        confidence,
        bbox: BoundingBox::new(1.0, 1.0, 8.0, 8.0),
    }
}

/// Encoded PNG of a solid grey image
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([90, 90, 90]));
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}
