//! ONNX Runtime backend
//!
//! For classifiers exported with skl2onnx (`zipmap=False`). The
//! probability output is a `[1, 2]` tensor; a `[1, 1]` output is read
//! as a sigmoid score.

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use std::path::Path;

use super::classifier::Classifier;
use super::inference::InferenceError;

pub struct OnnxClassifier {
    name: String,
    // Session::run needs &mut
    session: Mutex<Session>,
    output_name: String,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        tracing::info!(path = %path.display(), "Loading ONNX model");

        let session = Session::builder()
            .map_err(|e| InferenceError::Runtime(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError::Runtime(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| InferenceError::Artifact(format!("Failed to load model: {}", e)))?;

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .ok_or_else(|| InferenceError::Artifact("No output defined".to_string()))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());

        tracing::info!(model = %name, output = %output_name, "ONNX model loaded");

        Ok(Self {
            name,
            session: Mutex::new(session),
            output_name,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict_proba(&self, scaled: &[f64]) -> Result<f64, InferenceError> {
        let row: Vec<f32> = scaled.iter().map(|&v| v as f32).collect();
        let input_array = Array2::<f32>::from_shape_vec((1, row.len()), row)
            .map_err(|e| InferenceError::Runtime(format!("Array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| InferenceError::Runtime(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError::Runtime(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| InferenceError::Runtime("No output".to_string()))?;

        let output_tensor = output
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Runtime(format!("Extract error: {}", e)))?;

        let data = output_tensor.1;
        let score = match data.len() {
            0 => return Err(InferenceError::Runtime("Empty output".to_string())),
            n => data[n - 1] as f64,
        };

        if !score.is_finite() {
            return Err(InferenceError::NonFinite);
        }
        Ok(score)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
