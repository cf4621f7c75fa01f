//! Detection response contract

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::inference::RawDetection;
use crate::knowledge::DefectRecord;

/// A model detection joined with its knowledge-base record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    #[serde(rename = "class")]
    pub class_key: String,
    /// Percentage, 0 - 100
    pub confidence: f32,
    /// `[x1, y1, x2, y2]` in source image pixels
    pub bbox: [f32; 4],
    pub priority: String,
    pub power_loss: String,
    pub category: String,
    pub stress_factors: Vec<String>,
    pub description: String,
    pub recommendations: Vec<String>,
}

impl Detection {
    pub fn enrich(raw: &RawDetection, record: &DefectRecord) -> Self {
        Self {
            class_key: raw.class_name.to_lowercase(),
            confidence: to_percent(raw.confidence),
            bbox: raw.bbox.to_xyxy(),
            priority: record.severity_level.clone(),
            power_loss: record.power_loss.clone(),
            category: record.category.clone(),
            stress_factors: record.stress_factors.clone(),
            description: record.description.clone(),
            recommendations: record.recommendations.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectResponse {
    pub status: String,
    pub detections: Vec<Detection>,
    pub total_detections: usize,
    pub processing_time_ms: f64,
    pub request_id: Uuid,
}

impl DetectResponse {
    pub fn success(detections: Vec<Detection>, processing_time_ms: f64, request_id: Uuid) -> Self {
        Self {
            status: "success".to_string(),
            total_detections: detections.len(),
            detections,
            processing_time_ms,
            request_id,
        }
    }
}

/// Probability to a percentage with two decimals
fn to_percent(probability: f32) -> f32 {
    (probability * 10_000.0).round() / 100.0
}
