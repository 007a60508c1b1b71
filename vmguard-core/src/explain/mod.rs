//! Explain Module - post-hoc feature attribution
//!
//! Optional enrichment after a prediction. Failures here never fail
//! the prediction itself.

pub mod engine;
pub mod types;

pub use engine::{
    explain_or_placeholder, rank, Explainer, LimeExplainer, OcclusionExplainer, DEFAULT_TOP_N,
};
pub use types::{ExplainError, Explanation, FeatureContribution, PLACEHOLDER_FEATURE};
