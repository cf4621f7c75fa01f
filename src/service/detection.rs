use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use uuid::Uuid;

use super::annotate::draw_detections;
use super::upload::UploadedFile;
use crate::inference::{Detector, InferenceStats, ModelMetadata, RawDetection};
use crate::knowledge::KnowledgeBase;
use crate::models::{DetectResponse, Detection};
use crate::{AppError, AppResult};

pub struct DetectionService {
    knowledge: Arc<KnowledgeBase>,
    detector: Option<Arc<dyn Detector>>,
    confidence_threshold: f32,
    stats: InferenceStats,
}

impl DetectionService {
    /// `detector` is `None` when the model failed to load at startup.
    pub fn new(
        knowledge: Arc<KnowledgeBase>,
        detector: Option<Arc<dyn Detector>>,
        confidence_threshold: f32,
    ) -> Self {
        Self {
            knowledge,
            detector,
            confidence_threshold,
            stats: InferenceStats::default(),
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn is_model_loaded(&self) -> bool {
        self.detector.is_some()
    }

    pub fn model_metadata(&self) -> Option<ModelMetadata> {
        self.detector.as_ref().map(|d| d.metadata())
    }

    pub fn stats(&self) -> &InferenceStats {
        &self.stats
    }

    /// Full pipeline for `POST /detect/`.
    pub fn detect(&self, upload: &UploadedFile, request_id: Uuid) -> AppResult<DetectResponse> {
        let started = Instant::now();

        upload.validate()?;
        let image = decode_image(&upload.bytes)?;
        let detections = self.detect_image(&image)?;

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(
            %request_id,
            detections = detections.len(),
            elapsed_ms,
            "Detection completed"
        );

        Ok(DetectResponse::success(detections, elapsed_ms, request_id))
    }

    /// Same pipeline, but returns the JPEG with boxes drawn and the box count.
    pub fn detect_annotated(
        &self,
        upload: &UploadedFile,
        request_id: Uuid,
    ) -> AppResult<(Vec<u8>, usize)> {
        let started = Instant::now();

        upload.validate()?;
        let image = decode_image(&upload.bytes)?;
        let detections = self.detect_image(&image)?;
        let jpeg = draw_detections(&image, &detections)?;

        tracing::info!(
            %request_id,
            detections = detections.len(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Annotated detection completed"
        );

        Ok((jpeg, detections.len()))
    }

    /// Infer, filter and enrich an already decoded image.
    pub fn detect_image(&self, image: &DynamicImage) -> AppResult<Vec<Detection>> {
        let raw = self.infer(image)?;
        let confident = filter_by_confidence(raw, self.confidence_threshold);
        Ok(self.enrich(&confident))
    }

    fn infer(&self, image: &DynamicImage) -> AppResult<Vec<RawDetection>> {
        let detector = self.detector.as_ref().ok_or(AppError::ModelUnavailable)?;

        let started = Instant::now();
        match detector.detect(image) {
            Ok(raw) => {
                self.stats
                    .record_success(started.elapsed().as_micros() as u64);
                Ok(raw)
            }
            Err(e) => {
                self.stats.record_failure();
                Err(e.into())
            }
        }
    }

    /// Join each detection with its record; classes without one are dropped.
    pub fn enrich(&self, raw: &[RawDetection]) -> Vec<Detection> {
        raw.iter()
            .filter_map(|detection| match self.knowledge.lookup(&detection.class_name) {
                Some(record) => Some(Detection::enrich(detection, record)),
                None => {
                    tracing::debug!(class = %detection.class_name, "No defect record, skipping");
                    None
                }
            })
            .collect()
    }
}

pub fn decode_image(bytes: &[u8]) -> AppResult<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| AppError::InvalidImage(e.to_string()))
}

pub fn filter_by_confidence(raw: Vec<RawDetection>, threshold: f32) -> Vec<RawDetection> {
    raw.into_iter()
        .filter(|detection| detection.confidence >= threshold)
        .collect()
}
