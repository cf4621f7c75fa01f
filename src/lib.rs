//! Solar Panel Defect Detection API
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   SOLAR DEFECT API                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌────────────────────┐   ┌───────────────┐  │
//! │  │  HTTP     │──▶│ Detection Service  │──▶│ Inference     │  │
//! │  │  (Axum)   │   │ validate → enrich  │   │ Adapter (ORT) │  │
//! │  └───────────┘   └─────────┬──────────┘   └───────────────┘  │
//! │                            ▼                                 │
//! │                  ┌────────────────────┐                      │
//! │                  │ Defect Knowledge   │                      │
//! │                  │ Base (read-only)   │                      │
//! │                  └────────────────────┘                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod inference;
pub mod knowledge;
pub mod models;
pub mod service;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use error::{AppError, AppResult};

use config::Config;
use inference::{Detector, YoloDetector, YoloParams};
use knowledge::KnowledgeBase;
use service::DetectionService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DetectionService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, service: DetectionService) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
        }
    }

    /// Load the knowledge base and the model once for the process lifetime.
    ///
    /// A broken defect table aborts startup. A model that fails to load does
    /// not: the server starts and reports itself unavailable.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let knowledge = match &config.knowledge_base_path {
            Some(path) => KnowledgeBase::from_path(path)
                .with_context(|| format!("Failed to load defect table {}", path.display()))?,
            None => KnowledgeBase::load_embedded().context("Embedded defect table is invalid")?,
        };
        tracing::info!(
            "Defect knowledge base loaded: {} classes (schema v{})",
            knowledge.len(),
            knowledge.source_version()
        );

        let detector = load_detector(&config);

        let service = DetectionService::new(
            Arc::new(knowledge),
            detector,
            config.confidence_threshold,
        );
        Ok(Self::new(config, service))
    }
}

fn load_detector(config: &Config) -> Option<Arc<dyn Detector>> {
    let class_names = match inference::read_class_names(&config.class_names_path) {
        Ok(names) => names,
        Err(e) => {
            tracing::error!(
                "Failed to read class names {}: {}",
                config.class_names_path.display(),
                e
            );
            return None;
        }
    };

    let params = YoloParams {
        input_size: config.model_input_size,
        min_confidence: config.model_min_confidence,
        iou_threshold: config.iou_threshold,
    };

    match YoloDetector::load(&config.model_path, class_names, params) {
        Ok(detector) => Some(Arc::new(detector)),
        Err(e) => {
            tracing::error!("Error loading model: {}", e);
            None
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::root::index))
        .route("/health", get(handlers::health::check))
        // Detection
        .route("/detect", post(handlers::detect::detect))
        .route("/detect/", post(handlers::detect::detect))
        .route("/detect/annotated", post(handlers::detect::detect_annotated))
        // Knowledge base
        .route("/defect-info", get(handlers::defect_info::list))
        .route("/defect-info/:class_name", get(handlers::defect_info::get))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
