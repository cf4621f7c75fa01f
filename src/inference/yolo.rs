//! YOLOv8 detector on ONNX Runtime

use std::path::Path;

use image::DynamicImage;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use super::postprocess::{check_output_shape, decode_yolo_output, non_maximum_suppression};
use super::preprocess::{letterbox, to_nchw_tensor};
use super::{Detector, InferenceError, ModelMetadata, RawDetection};

#[derive(Debug, Clone)]
pub struct YoloParams {
    /// Square input size, 640 for the exported solar model
    pub input_size: u32,
    /// Scores below this never leave the adapter
    pub min_confidence: f32,
    pub iou_threshold: f32,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            min_confidence: 0.25,
            iou_threshold: 0.45,
        }
    }
}

pub struct YoloDetector {
    // ort sessions need `&mut` to run
    session: Mutex<Session>,
    output_name: String,
    class_names: Vec<String>,
    params: YoloParams,
    metadata: ModelMetadata,
}

impl YoloDetector {
    /// Load ONNX model from file
    pub fn load(
        model_path: &Path,
        class_names: Vec<String>,
        params: YoloParams,
    ) -> Result<Self, InferenceError> {
        tracing::info!("Loading ONNX model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(InferenceError::ModelNotFound(model_path.display().to_string()));
        }
        if class_names.is_empty() {
            return Err(InferenceError::Load("no class names configured".to_string()));
        }

        let model_bytes = std::fs::read(model_path)
            .map_err(|e| InferenceError::Load(format!("Failed to read model: {}", e)))?;
        let sha256 = format!("{:x}", Sha256::digest(&model_bytes));

        let session = Session::builder()
            .map_err(|e| InferenceError::Load(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError::Load(format!("Failed to set optimization: {}", e)))?
            .commit_from_memory(&model_bytes)
            .map_err(|e| InferenceError::Load(format!("Failed to load model: {}", e)))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| InferenceError::Load("No output defined".to_string()))?;

        tracing::info!(
            sha256 = %sha256,
            classes = class_names.len(),
            "ONNX model loaded successfully"
        );

        let metadata = ModelMetadata {
            model_path: model_path.display().to_string(),
            model_type: "yolov8".to_string(),
            input_size: params.input_size,
            classes: class_names.clone(),
            sha256: Some(sha256),
            loaded_at: chrono::Utc::now(),
        };

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            class_names,
            params,
            metadata,
        })
    }

    /// Run the session and copy the raw output out of the locked session.
    fn run_session(&self, input: ndarray::Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        let input_tensor = Value::from_array(input)
            .map_err(|e| InferenceError::Run(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError::Run(e.to_string()))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| InferenceError::Output("No output".to_string()))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Output(format!("Extract error: {}", e)))?;

        let dims: &[i64] = shape;
        check_output_shape(dims, self.class_names.len())?;

        Ok(data.to_vec())
    }
}

impl Detector for YoloDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<RawDetection>, InferenceError> {
        let (canvas, geometry) = letterbox(image, self.params.input_size);
        let input = to_nchw_tensor(&canvas);

        let data = self.run_session(input)?;

        let decoded = decode_yolo_output(
            &data,
            &self.class_names,
            self.params.min_confidence,
            &geometry,
        )?;
        let candidates = decoded.len();
        let detections = non_maximum_suppression(decoded, self.params.iou_threshold);

        tracing::debug!(
            candidates,
            kept = detections.len(),
            "YOLO postprocessing finished"
        );

        Ok(detections)
    }

    fn metadata(&self) -> ModelMetadata {
        self.metadata.clone()
    }
}
