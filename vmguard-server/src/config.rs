//! Configuration module

use std::env;
use std::str::FromStr;

use vmguard_core::explain::DEFAULT_TOP_N;
use vmguard_core::model::decision::DEFAULT_THRESHOLD;
use vmguard_core::DecisionRule;

/// Attribution method wired into the HTML path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplainerKind {
    Occlusion,
    Lime,
    Disabled,
}

impl FromStr for ExplainerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "occlusion" | "shap" => Ok(ExplainerKind::Occlusion),
            "lime" => Ok(ExplainerKind::Lime),
            "none" | "off" | "disabled" => Ok(ExplainerKind::Disabled),
            other => Err(format!("unknown explainer `{}`", other)),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Trained classifier artifact (.json, or .onnx with the `onnx` feature)
    pub model_path: String,

    /// Fitted scaler artifact
    pub scaler_path: String,

    /// Attribution method
    pub explainer: ExplainerKind,

    /// Number of attributions returned
    pub top_n: usize,

    /// Perturbation samples per LIME explanation
    pub lime_samples: usize,

    /// LIME sampler seed
    pub lime_seed: u64,

    /// Score → class rule
    pub decision: DecisionRule,

    /// Emit JSON log lines
    pub log_json: bool,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_vars(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_vars<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let explainer = match get("EXPLAINER").map(|v| v.parse::<ExplainerKind>()) {
            Some(Ok(kind)) => kind,
            Some(Err(e)) => {
                tracing::warn!("{}, falling back to occlusion", e);
                ExplainerKind::Occlusion
            }
            None => ExplainerKind::Occlusion,
        };

        let threshold = match get("DECISION_THRESHOLD").map(|t| t.parse::<f64>()) {
            Some(Ok(t)) if t.is_finite() && (0.0..=1.0).contains(&t) => t,
            Some(_) => {
                tracing::warn!(
                    "DECISION_THRESHOLD must be a number in [0, 1], falling back to {}",
                    DEFAULT_THRESHOLD
                );
                DEFAULT_THRESHOLD
            }
            None => DEFAULT_THRESHOLD,
        };
        let decision = match get("DECISION_MODE").as_deref() {
            Some("round") | Some("round_score") => DecisionRule::RoundScore,
            _ => DecisionRule::threshold(threshold),
        };

        Self {
            port: get("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),

            model_path: get("MODEL_PATH")
                .unwrap_or_else(|| "ffnn_model_n.json".to_string()),

            scaler_path: get("SCALER_PATH")
                .unwrap_or_else(|| "scaler_n.json".to_string()),

            explainer,

            top_n: get("EXPLAIN_TOP_N")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_TOP_N),

            lime_samples: get("LIME_SAMPLES")
                .and_then(|n| n.parse().ok())
                .unwrap_or(500),

            lime_seed: get("LIME_SEED")
                .and_then(|n| n.parse().ok())
                .unwrap_or(42),

            decision,

            log_json: get("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),

            environment: get("ENVIRONMENT")
                .unwrap_or_else(|| "development".to_string()),
        }
    }

    /// Production always logs JSON
    pub fn json_logs(&self) -> bool {
        self.log_json || self.is_production()
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.model_path, "ffnn_model_n.json");
        assert_eq!(config.scaler_path, "scaler_n.json");
        assert_eq!(config.explainer, ExplainerKind::Occlusion);
        assert_eq!(config.top_n, 5);
        assert_eq!(config.decision, DecisionRule::threshold(0.5));
        assert!(!config.log_json);
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("PORT", "8088"),
            ("EXPLAINER", "LIME"),
            ("EXPLAIN_TOP_N", "12"),
            ("DECISION_MODE", "round"),
            ("LOG_FORMAT", "json"),
            ("ENVIRONMENT", "production"),
        ]);
        assert_eq!(config.port, 8088);
        assert_eq!(config.explainer, ExplainerKind::Lime);
        assert_eq!(config.top_n, 12);
        assert_eq!(config.decision, DecisionRule::RoundScore);
        assert!(config.log_json);
        assert!(config.is_production());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_map(&[
            ("PORT", "http"),
            ("EXPLAINER", "gradcam"),
            ("EXPLAIN_TOP_N", "0"),
            ("DECISION_THRESHOLD", "0.7"),
        ]);
        assert_eq!(config.port, 5000);
        assert_eq!(config.explainer, ExplainerKind::Occlusion);
        assert_eq!(config.top_n, 5);
        assert_eq!(config.decision, DecisionRule::threshold(0.7));
    }

    #[test]
    fn test_threshold_outside_unit_interval_falls_back() {
        for raw in ["NaN", "inf", "-0.1", "1.5", "half"] {
            let config = from_map(&[("DECISION_THRESHOLD", raw)]);
            assert_eq!(config.decision, DecisionRule::threshold(0.5), "input {}", raw);
        }
        for (raw, expected) in [("0", 0.0), ("1", 1.0), ("0.25", 0.25)] {
            let config = from_map(&[("DECISION_THRESHOLD", raw)]);
            assert_eq!(config.decision, DecisionRule::threshold(expected));
        }
    }

    #[test]
    fn test_production_logs_json() {
        assert!(!Config::default().json_logs());
        assert!(from_map(&[("LOG_FORMAT", "json")]).json_logs());
        assert!(from_map(&[("ENVIRONMENT", "production"), ("LOG_FORMAT", "text")]).json_logs());
    }

    #[test]
    fn test_lime_seed() {
        assert_eq!(Config::default().lime_seed, 42);
        assert_eq!(from_map(&[("LIME_SEED", "7")]).lime_seed, 7);
    }

    #[test]
    fn test_disable_explainer() {
        assert_eq!("none".parse::<ExplainerKind>(), Ok(ExplainerKind::Disabled));
    }
}
