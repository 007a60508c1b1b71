//! Features Module - VM telemetry input handling
//!
//! Turns raw request fields into the ordered numeric row the scaler
//! and classifier were fit on.

pub mod clean;
pub mod layout;
pub mod vector;

// Re-export common types
pub use clean::{clean_numeric, coerce_feature, CleanError};
pub use layout::{
    describe, feature_index, feature_name, layout_hash, verify_feature_names, LayoutInfo,
    FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION,
};
pub use vector::{FeatureError, FeatureVector, RawValue};
