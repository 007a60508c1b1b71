//! Binary classifiers
//!
//! `MlpClassifier` evaluates a dense feed-forward network exported as
//! JSON (per-layer `weights[n_in][n_out]` and `biases[n_out]`).

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::inference::InferenceError;
use crate::features::{verify_feature_names, FEATURE_COUNT};

/// Pre-trained model scoring a scaled row
pub trait Classifier: Send + Sync {
    /// Positive-class probability, or the raw score for regression models
    fn predict_proba(&self, scaled: &[f64]) -> Result<f64, InferenceError>;

    fn name(&self) -> &str;
}

// ============================================================================
// ARTIFACT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Relu,
    Tanh,
    Logistic,
    Identity,
}

impl Activation {
    fn apply(self, z: &mut Array1<f64>) {
        match self {
            Activation::Relu => z.mapv_inplace(|v| v.max(0.0)),
            Activation::Tanh => z.mapv_inplace(f64::tanh),
            Activation::Logistic => z.mapv_inplace(sigmoid),
            Activation::Identity => {}
        }
    }
}

/// How the final layer is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// One logistic unit, or two softmax units (p1 is reported)
    #[default]
    Probability,
    /// One unbounded unit (regression score)
    Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayerArtifact {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpArtifact {
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default)]
    pub hidden_activation: Activation,
    #[serde(default)]
    pub output: OutputKind,
    /// Training column order; checked against `FEATURE_LAYOUT` when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub layers: Vec<DenseLayerArtifact>,
}

fn default_model_name() -> String {
    "ffnn".to_string()
}

// ============================================================================
// MLP
// ============================================================================

#[derive(Debug, Clone)]
struct DenseLayer {
    weights: Array2<f64>,
    biases: Array1<f64>,
}

#[derive(Debug, Clone)]
pub struct MlpClassifier {
    name: String,
    layers: Vec<DenseLayer>,
    hidden_activation: Activation,
    output: OutputKind,
}

impl TryFrom<MlpArtifact> for MlpClassifier {
    type Error = InferenceError;

    fn try_from(artifact: MlpArtifact) -> Result<Self, Self::Error> {
        if artifact.layers.is_empty() {
            return Err(InferenceError::Artifact("model has no layers".into()));
        }
        if let Some(names) = &artifact.feature_names {
            verify_feature_names(names.as_slice())
                .map_err(|e| InferenceError::Artifact(format!("model layout mismatch: {}", e)))?;
        }

        let mut layers = Vec::with_capacity(artifact.layers.len());
        let mut n_in = FEATURE_COUNT;

        for (idx, layer) in artifact.layers.into_iter().enumerate() {
            if layer.weights.len() != n_in {
                return Err(InferenceError::Artifact(format!(
                    "layer {} has {} input rows, expected {}",
                    idx,
                    layer.weights.len(),
                    n_in
                )));
            }

            let n_out = layer.biases.len();
            if n_out == 0 || layer.weights.iter().any(|row| row.len() != n_out) {
                return Err(InferenceError::Artifact(format!(
                    "layer {} weights do not match {} biases",
                    idx, n_out
                )));
            }

            let flat: Vec<f64> = layer.weights.into_iter().flatten().collect();
            let weights = Array2::from_shape_vec((n_in, n_out), flat)
                .map_err(|e| InferenceError::Artifact(format!("layer {}: {}", idx, e)))?;

            layers.push(DenseLayer {
                weights,
                biases: Array1::from(layer.biases),
            });
            n_in = n_out;
        }

        let valid_output = match artifact.output {
            OutputKind::Probability => n_in == 1 || n_in == 2,
            OutputKind::Identity => n_in == 1,
        };
        if !valid_output {
            return Err(InferenceError::Artifact(format!(
                "output layer has {} units, not valid for {:?} output",
                n_in, artifact.output
            )));
        }

        Ok(Self {
            name: artifact.name,
            layers,
            hidden_activation: artifact.hidden_activation,
            output: artifact.output,
        })
    }
}

impl MlpClassifier {
    fn forward(&self, scaled: &[f64]) -> Array1<f64> {
        let last = self.layers.len() - 1;
        let mut x = Array1::from(scaled.to_vec());

        for (i, layer) in self.layers.iter().enumerate() {
            let mut z = x.dot(&layer.weights) + &layer.biases;
            if i < last {
                self.hidden_activation.apply(&mut z);
            }
            x = z;
        }

        x
    }
}

impl Classifier for MlpClassifier {
    fn predict_proba(&self, scaled: &[f64]) -> Result<f64, InferenceError> {
        if scaled.len() != FEATURE_COUNT {
            return Err(InferenceError::Shape {
                expected: FEATURE_COUNT,
                actual: scaled.len(),
            });
        }

        let out = self.forward(scaled);
        let score = match (self.output, out.len()) {
            (OutputKind::Identity, _) => out[0],
            (OutputKind::Probability, 1) => sigmoid(out[0]),
            // softmax over two logits, positive class
            (OutputKind::Probability, _) => sigmoid(out[1] - out[0]),
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

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}
