//! Configuration module

use std::env;
use std::path::PathBuf;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// ONNX model exported from the trained detector
    pub model_path: PathBuf,

    /// Class names, one per line in model index order
    pub class_names_path: PathBuf,

    /// Optional defect table overriding the embedded one
    pub knowledge_base_path: Option<PathBuf>,

    /// Minimum confidence (0.0 - 1.0) for a detection to be reported
    pub confidence_threshold: f32,

    /// Floor applied by the model adapter before NMS
    pub model_min_confidence: f32,

    /// IoU threshold for non-maximum suppression
    pub iou_threshold: f32,

    /// Square model input size in pixels
    pub model_input_size: u32,

    /// Maximum accepted upload size
    pub max_upload_bytes: usize,

    pub log_format: LogFormat,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            model_path: PathBuf::from("model/yolov8-solar.onnx"),
            class_names_path: PathBuf::from("model/classes.txt"),
            knowledge_base_path: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            model_min_confidence: 0.25,
            iou_threshold: 0.45,
            model_input_size: 640,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_format: LogFormat::Pretty,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),

            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),

            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),

            class_names_path: lookup("CLASS_NAMES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.class_names_path),

            knowledge_base_path: lookup("DEFECT_KB_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),

            confidence_threshold: parse_var(&lookup, "CONFIDENCE_THRESHOLD")
                .map(clamp_unit)
                .unwrap_or(defaults.confidence_threshold),

            model_min_confidence: parse_var(&lookup, "MODEL_MIN_CONFIDENCE")
                .map(clamp_unit)
                .unwrap_or(defaults.model_min_confidence),

            iou_threshold: parse_var(&lookup, "IOU_THRESHOLD")
                .map(clamp_unit)
                .unwrap_or(defaults.iou_threshold),

            model_input_size: parse_var(&lookup, "MODEL_INPUT_SIZE")
                .filter(|s: &u32| *s > 0)
                .unwrap_or(defaults.model_input_size),

            max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES")
                .filter(|s: &usize| *s > 0)
                .unwrap_or(defaults.max_upload_bytes),

            log_format: match lookup("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },

            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
