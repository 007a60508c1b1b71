//! Inference Engine - scale → classify → decide
//!
//! `Predictor` is built once at startup and shared behind an `Arc` by
//! every request. Only the latency counters change after construction.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::classifier::Classifier;
use super::decision::DecisionRule;
use super::scaler::Scaler;
use crate::features::FeatureVector;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("expected {expected} features, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("model produced a non-finite score")]
    NonFinite,

    #[error("invalid model artifact: {0}")]
    Artifact(String),

    #[error("model runtime error: {0}")]
    Runtime(String),
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Prediction output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_class: u8,
    /// Positive-class probability, 0.0 - 1.0
    pub probability: f64,
    pub inference_time_us: u64,
}

impl Prediction {
    pub fn is_attack(&self) -> bool {
        self.predicted_class == 1
    }
}

/// Engine Status for the model endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub model_loaded: bool,
    pub model_name: String,
    pub scaler: String,
    pub decision: DecisionRule,
    pub avg_latency_ms: f64,
    pub inference_count: u64,
}

// ============================================================================
// PREDICTOR
// ============================================================================

pub struct Predictor {
    scaler: Arc<dyn Scaler>,
    classifier: Arc<dyn Classifier>,
    rule: DecisionRule,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl Predictor {
    pub fn new(scaler: Arc<dyn Scaler>, classifier: Arc<dyn Classifier>, rule: DecisionRule) -> Self {
        Self {
            scaler,
            classifier,
            rule,
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
        }
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Apply the fitted scaler to an ordered row
    pub fn scale(&self, vector: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
        self.scaler.transform(vector.as_slice())
    }

    pub fn predict(&self, vector: &FeatureVector) -> Result<Prediction, InferenceError> {
        let scaled = self.scale(vector)?;
        self.predict_scaled(&scaled)
    }

    /// Classify a row that has already been scaled
    pub fn predict_scaled(&self, scaled: &[f64]) -> Result<Prediction, InferenceError> {
        let start_time = Instant::now();

        let score = self.classifier.predict_proba(scaled)?;
        let (predicted_class, probability) = self.rule.decide(score);

        let inference_time_us = start_time.elapsed().as_micros() as u64;
        self.latency_sum_us.fetch_add(inference_time_us, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            model = self.classifier.name(),
            score,
            predicted_class,
            inference_time_us,
            "Prediction complete"
        );

        Ok(Prediction {
            predicted_class,
            probability,
            inference_time_us,
        })
    }

    pub fn status(&self) -> EngineStatus {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f64 / count as f64) / 1000.0 } else { 0.0 };

        EngineStatus {
            model_loaded: true,
            model_name: self.classifier.name().to_string(),
            scaler: self.scaler.kind().to_string(),
            decision: self.rule,
            avg_latency_ms: avg,
            inference_count: count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_COUNT;
    use crate::model::classifier::{Activation, DenseLayerArtifact, MlpArtifact, MlpClassifier, OutputKind};
    use crate::model::scaler::ScalerArtifact;

    /// p = sigmoid(sum of scaled features)
    fn predictor(rule: DecisionRule) -> Predictor {
        let scaler = ScalerArtifact::Standard {
            mean: vec![100.0; FEATURE_COUNT],
            scale: vec![50.0; FEATURE_COUNT],
            feature_names: None,
        }
        .into_scaler()
        .unwrap();

        let classifier = MlpClassifier::try_from(MlpArtifact {
            name: "sum".into(),
            hidden_activation: Activation::Relu,
            output: OutputKind::Probability,
            feature_names: None,
            layers: vec![DenseLayerArtifact {
                weights: vec![vec![1.0]; FEATURE_COUNT],
                biases: vec![0.0],
            }],
        })
        .unwrap();

        Predictor::new(Arc::from(scaler), Arc::new(classifier), rule)
    }

    #[test]
    fn test_predict_at_mean_is_coin_flip() {
        let p = predictor(DecisionRule::default());
        let result = p.predict(&FeatureVector::from_values([100.0; FEATURE_COUNT])).unwrap();
        assert_eq!(result.probability, 0.5);
        assert_eq!(result.predicted_class, 1);
    }

    #[test]
    fn test_class_matches_probability() {
        let p = predictor(DecisionRule::default());
        for level in [0.0, 60.0, 99.0, 101.0, 150.0, 400.0] {
            let result = p.predict(&FeatureVector::from_values([level; FEATURE_COUNT])).unwrap();
            assert!((0.0..=1.0).contains(&result.probability));
            assert_eq!(result.is_attack(), result.probability >= 0.5);
        }
    }

    #[test]
    fn test_status_counts_inferences() {
        let p = predictor(DecisionRule::RoundScore);
        let vector = FeatureVector::from_values([0.0; FEATURE_COUNT]);
        p.predict(&vector).unwrap();
        p.predict(&vector).unwrap();

        let status = p.status();
        assert!(status.model_loaded);
        assert_eq!(status.model_name, "sum");
        assert_eq!(status.scaler, "standard");
        assert_eq!(status.inference_count, 2);
        assert_eq!(status.decision, DecisionRule::RoundScore);
    }
}
