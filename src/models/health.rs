//! Health check payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub version: String,
    pub timestamp: i64,
    pub model: Option<ModelHealth>,
    pub knowledge_base_version: u32,
    pub defect_classes: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelHealth {
    pub model_path: String,
    pub model_type: String,
    pub input_size: u32,
    pub model_sha256: Option<String>,
    pub loaded_at: DateTime<Utc>,
    pub classes: Vec<String>,
    pub inference_count: u64,
    pub failure_count: u64,
    pub avg_latency_ms: f32,
}
