//! Decision rule - turns a model score into a class label
//!
//! Probability models are thresholded. Regression-style models emit a
//! raw score that is rounded to the nearest class instead.

use serde::{Deserialize, Serialize};

pub const DEFAULT_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DecisionRule {
    /// Class 1 iff probability >= threshold
    Threshold { threshold: f64 },
    /// Class = round(score), clamped to {0, 1}
    RoundScore,
}

impl Default for DecisionRule {
    fn default() -> Self {
        DecisionRule::Threshold {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl DecisionRule {
    pub fn threshold(threshold: f64) -> Self {
        DecisionRule::Threshold { threshold }
    }

    /// Returns (predicted class, reported probability in [0, 1])
    pub fn decide(&self, score: f64) -> (u8, f64) {
        let probability = score.clamp(0.0, 1.0);
        let class = match *self {
            DecisionRule::Threshold { threshold } => u8::from(score >= threshold),
            DecisionRule::RoundScore => score.round().clamp(0.0, 1.0) as u8,
        };
        (class, probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold() {
        let rule = DecisionRule::default();
        assert_eq!(rule.decide(0.4999), (0, 0.4999));
        assert_eq!(rule.decide(0.5), (1, 0.5));
        assert_eq!(rule.decide(0.987), (1, 0.987));
    }

    #[test]
    fn test_custom_threshold() {
        let rule = DecisionRule::threshold(0.8);
        assert_eq!(rule.decide(0.79).0, 0);
        assert_eq!(rule.decide(0.8).0, 1);
    }

    #[test]
    fn test_round_score() {
        let rule = DecisionRule::RoundScore;
        assert_eq!(rule.decide(0.49), (0, 0.49));
        assert_eq!(rule.decide(0.5), (1, 0.5));
        assert_eq!(rule.decide(1.7), (1, 1.0));
        assert_eq!(rule.decide(-0.3), (0, 0.0));
    }

    #[test]
    fn test_serde_shape() {
        let rule: DecisionRule =
            serde_json::from_str(r#"{"mode":"threshold","threshold":0.6}"#).unwrap();
        assert_eq!(rule, DecisionRule::threshold(0.6));

        let rule: DecisionRule = serde_json::from_str(r#"{"mode":"round_score"}"#).unwrap();
        assert_eq!(rule, DecisionRule::RoundScore);
    }
}
