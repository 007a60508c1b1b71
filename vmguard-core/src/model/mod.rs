//! Model Module - Scaling, classification and decision
//!
//! The scaler and classifier are opaque, pre-fitted artifacts loaded
//! once at startup. Everything here is read-only after load.

pub mod classifier;
pub mod decision;
pub mod inference;
pub mod loader;
pub mod scaler;

#[cfg(feature = "onnx")]
pub mod onnx;

// Re-export common types
pub use classifier::{Activation, Classifier, MlpArtifact, MlpClassifier, OutputKind};
pub use decision::DecisionRule;
pub use inference::{EngineStatus, InferenceError, Prediction, Predictor};
pub use loader::{load_classifier, load_predictor, load_scaler};
pub use scaler::{Scaler, ScalerArtifact};
