use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::InferenceError;

/// Label of the single entry reported when attribution fails
pub const PLACEHOLDER_FEATURE: &str = "Explainability Error";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: String,
    pub contribution: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Explanation {
    Ranked {
        method: String,
        contributions: Vec<FeatureContribution>,
    },
    Failed {
        reason: String,
    },
}

impl Explanation {
    /// Ranked entries, or the placeholder entry on failure
    pub fn contributions(&self) -> Vec<FeatureContribution> {
        match self {
            Explanation::Ranked { contributions, .. } => contributions.clone(),
            Explanation::Failed { .. } => vec![FeatureContribution {
                feature: PLACEHOLDER_FEATURE.to_string(),
                contribution: 0.0,
                description: None,
            }],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Explanation::Failed { .. })
    }
}

#[derive(Debug, Clone, Error)]
pub enum ExplainError {
    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("attribution for `{0}` is not finite")]
    NonFinite(String),

    #[error("ridge system is singular")]
    Singular,

    #[error("explainer panicked: {0}")]
    Panicked(String),
}
