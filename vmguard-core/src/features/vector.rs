//! Feature Vector - Core data structure for ML input
//!
//! **Versioned feature vector with layout validation**
//!
//! Every request body, form or JSON, is reduced to one of these before
//! anything numeric happens. From here on the row order is fixed by
//! `FEATURE_LAYOUT`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::clean::coerce_feature;
use super::layout::{layout_hash, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};

// ============================================================================
// ERRORS
// ============================================================================

/// Client-side input errors. Both map to a 400.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("Missing one or more required features: {}", .features.join(", "))]
    Missing { features: Vec<String> },

    #[error("Bad numeric value → {reason}")]
    BadValue {
        feature: String,
        value: String,
        reason: String,
    },
}

// ============================================================================
// RAW INPUT
// ============================================================================

/// One raw field as it arrived on the wire
#[derive(Debug, Clone, Copy)]
pub enum RawValue<'a> {
    /// Form field or any other free text
    Text(&'a str),
    /// JSON scalar (strings are cleaned, numbers taken as-is)
    Json(&'a Value),
}

impl RawValue<'_> {
    fn to_f64(self, feature: &str) -> Result<f64, FeatureError> {
        let text = match self {
            RawValue::Text(s) => s,
            RawValue::Json(Value::String(s)) => s.as_str(),
            RawValue::Json(Value::Number(n)) => {
                return n.as_f64().ok_or_else(|| FeatureError::BadValue {
                    feature: feature.to_string(),
                    value: n.to_string(),
                    reason: format!("number {} is out of range", n),
                });
            }
            // Matches an empty form field
            RawValue::Json(Value::Null) => "",
            RawValue::Json(other) => {
                return Err(FeatureError::BadValue {
                    feature: feature.to_string(),
                    value: other.to_string(),
                    reason: format!("'{}' expects a number or string, got {}", feature, other),
                });
            }
        };

        coerce_feature(text).map_err(|e| FeatureError::BadValue {
            feature: feature.to_string(),
            value: text.to_string(),
            reason: e.to_string(),
        })
    }

    /// Original text for echoing back into the form
    pub fn display(self) -> String {
        match self {
            RawValue::Text(s) => s.to_string(),
            RawValue::Json(Value::String(s)) => s.clone(),
            RawValue::Json(Value::Null) => String::new(),
            RawValue::Json(other) => other.to_string(),
        }
    }
}

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

/// Ordered numeric row in `FEATURE_LAYOUT` order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout
    pub layout_hash: u32,
    /// Feature values in order defined by FEATURE_LAYOUT
    pub values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Create from already-ordered values
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    /// Build from a name lookup.
    ///
    /// Presence of every feature is checked before any value is parsed,
    /// so a request missing fields never reaches numeric coercion.
    pub fn from_lookup<'a, F>(mut lookup: F) -> Result<Self, FeatureError>
    where
        F: FnMut(&str) -> Option<RawValue<'a>>,
    {
        let mut raw = Vec::with_capacity(FEATURE_COUNT);
        let mut missing = Vec::new();

        for name in FEATURE_LAYOUT {
            match lookup(name) {
                Some(value) => raw.push(value),
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(FeatureError::Missing { features: missing });
        }

        let mut values = [0.0f64; FEATURE_COUNT];
        for (i, (name, value)) in FEATURE_LAYOUT.iter().zip(raw).enumerate() {
            values[i] = value.to_f64(name)?;
        }

        Ok(Self::from_values(values))
    }

    /// Get values as slice
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// (name, value) pairs in layout order
    pub fn named_values(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_LAYOUT.iter().copied().zip(self.values.iter().copied())
    }

    /// Convert to JSON for structured logging
    pub fn to_log_entry(&self) -> Value {
        serde_json::json!({
            "feature_version": self.version,
            "layout_hash": self.layout_hash,
            "named_values": self.named_values()
                .map(|(k, v)| (k.to_string(), Value::from(v)))
                .collect::<serde_json::Map<_, _>>(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
