//! Health check handler

use axum::{extract::State, http::StatusCode, Json};

use crate::models::{HealthResponse, ModelHealth};
use crate::AppState;

/// 200 when the model is loaded, 503 otherwise.
pub async fn check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let service = &state.service;
    let stats = service.stats();

    let model = service.model_metadata().map(|meta| ModelHealth {
        model_path: meta.model_path,
        model_type: meta.model_type,
        input_size: meta.input_size,
        model_sha256: meta.sha256,
        loaded_at: meta.loaded_at,
        classes: meta.classes,
        inference_count: stats.inference_count(),
        failure_count: stats.failure_count(),
        avg_latency_ms: stats.avg_latency_ms(),
    });

    let loaded = service.is_model_loaded();
    let status = if loaded {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthResponse {
        status: if loaded { "healthy" } else { "unhealthy" }.to_string(),
        model_loaded: loaded,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().timestamp(),
        model,
        knowledge_base_version: service.knowledge().source_version(),
        defect_classes: service.knowledge().len(),
    };

    (status, Json(body))
}
