//! Model metadata and latency counters for the health endpoint

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub model_type: String,
    pub input_size: u32,
    pub classes: Vec<String>,
    pub sha256: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

/// Lock-free inference counters shared by all requests.
#[derive(Debug, Default)]
pub struct InferenceStats {
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
    failure_count: AtomicU64,
}

impl InferenceStats {
    pub fn record_success(&self, elapsed_us: u64) {
        self.latency_sum_us.fetch_add(elapsed_us, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inference_count(&self) -> u64 {
        self.inference_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn avg_latency_ms(&self) -> f32 {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count();
        if count > 0 {
            (sum as f32 / count as f32) / 1000.0
        } else {
            0.0
        }
    }
}
