//! VM Guard Core
//!
//! Feature layout, input cleaning, scaling, classification and
//! explainability for the VM attack detector.
//!
//! ```text
//!  raw request fields ──► features::FeatureVector (ordered, cleaned)
//!                                   │
//!                                   ▼
//!                     model::Predictor (scaler → classifier → decision)
//!                                   │
//!                                   ▼
//!                     explain::explain_or_placeholder (optional)
//! ```

pub mod explain;
pub mod features;
pub mod model;

pub use explain::{Explainer, Explanation, FeatureContribution};
pub use features::{FeatureError, FeatureVector, RawValue, FEATURE_COUNT, FEATURE_LAYOUT};
pub use model::{Classifier, DecisionRule, InferenceError, Prediction, Predictor, Scaler};
