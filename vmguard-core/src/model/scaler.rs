//! Feature scalers
//!
//! Mirrors the two transforms the training pipeline used: standardization
//! (the deployed model) and min-max normalization.

use serde::{Deserialize, Serialize};

use super::inference::InferenceError;
use crate::features::{verify_feature_names, FEATURE_COUNT};

/// Pre-fitted row transform applied before inference
pub trait Scaler: Send + Sync {
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError>;

    fn kind(&self) -> &'static str;
}

/// On-disk scaler parameters
///
/// `feature_names` is the column order the scaler was fit on
/// (sklearn's `feature_names_in_`). When present it must match
/// `FEATURE_LAYOUT` exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    Standard {
        mean: Vec<f64>,
        scale: Vec<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feature_names: Option<Vec<String>>,
    },
    MinMax {
        min: Vec<f64>,
        max: Vec<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feature_names: Option<Vec<String>>,
    },
}

impl ScalerArtifact {
    /// Validate layout and widths, then build the runtime scaler
    pub fn into_scaler(self) -> Result<Box<dyn Scaler>, InferenceError> {
        match self {
            ScalerArtifact::Standard {
                mean,
                scale,
                feature_names,
            } => {
                check_layout(feature_names.as_deref())?;
                check_width("mean", &mean)?;
                check_width("scale", &scale)?;
                Ok(Box::new(StandardScaler::new(mean, scale)))
            }
            ScalerArtifact::MinMax {
                min,
                max,
                feature_names,
            } => {
                check_layout(feature_names.as_deref())?;
                check_width("min", &min)?;
                check_width("max", &max)?;
                Ok(Box::new(MinMaxScaler::new(min, max)))
            }
        }
    }
}

fn check_layout(feature_names: Option<&[String]>) -> Result<(), InferenceError> {
    match feature_names {
        Some(names) => verify_feature_names(names)
            .map_err(|e| InferenceError::Artifact(format!("scaler layout mismatch: {}", e))),
        None => Ok(()),
    }
}

fn check_width(field: &str, values: &[f64]) -> Result<(), InferenceError> {
    if values.len() != FEATURE_COUNT {
        return Err(InferenceError::Artifact(format!(
            "scaler `{}` has {} entries, expected {}",
            field,
            values.len(),
            FEATURE_COUNT
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(InferenceError::Artifact(format!(
            "scaler `{}` contains non-finite values",
            field
        )));
    }
    Ok(())
}

fn check_row(row: &[f64], expected: usize) -> Result<(), InferenceError> {
    if row.len() != expected {
        return Err(InferenceError::Shape {
            expected,
            actual: row.len(),
        });
    }
    Ok(())
}

/// `(x - mean) / scale`
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        // Constant columns were fit with zero variance
        let scale = scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();
        Self { mean, scale }
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        check_row(row, self.mean.len())?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }

    fn kind(&self) -> &'static str {
        "standard"
    }
}

/// `(x - min) / (max - min)`, unclamped
#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    min: Vec<f64>,
    range: Vec<f64>,
}

impl MinMaxScaler {
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> Self {
        let range = min
            .iter()
            .zip(&max)
            .map(|(lo, hi)| {
                let r = hi - lo;
                if r == 0.0 { 1.0 } else { r }
            })
            .collect();
        Self { min, range }
    }
}

impl Scaler for MinMaxScaler {
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        check_row(row, self.min.len())?;
        Ok(row
            .iter()
            .zip(self.min.iter().zip(&self.range))
            .map(|(x, (lo, r))| (x - lo) / r)
            .collect())
    }

    fn kind(&self) -> &'static str {
        "min_max"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn standard() -> Box<dyn Scaler> {
        let mut mean = vec![10.0; FEATURE_COUNT];
        let mut scale = vec![2.0; FEATURE_COUNT];
        mean[3] = 0.0;
        scale[3] = 0.0;
        ScalerArtifact::Standard {
            mean,
            scale,
            feature_names: None,
        }
        .into_scaler()
        .unwrap()
    }

    #[test]
    fn test_standard_maps_mean_to_zero() {
        let scaler = standard();
        let out = scaler.transform(&[10.0; FEATURE_COUNT]).unwrap();
        assert_eq!(out[0], 0.0);
        assert_eq!(out[16], 0.0);
    }

    #[test]
    fn test_standard_zero_scale_is_identity_shift() {
        let scaler = standard();
        let out = scaler.transform(&[14.0; FEATURE_COUNT]).unwrap();
        assert_eq!(out[0], 2.0);
        assert_eq!(out[3], 14.0);
    }

    #[test]
    fn test_min_max() {
        let scaler = ScalerArtifact::MinMax {
            min: vec![0.0; FEATURE_COUNT],
            max: vec![100.0; FEATURE_COUNT],
            feature_names: None,
        }
        .into_scaler()
        .unwrap();

        let out = scaler.transform(&[25.0; FEATURE_COUNT]).unwrap();
        assert_eq!(out[7], 0.25);
        assert_eq!(scaler.kind(), "min_max");
    }

    #[test]
    fn test_rejects_wrong_width() {
        let err = ScalerArtifact::Standard {
            mean: vec![0.0; 4],
            scale: vec![1.0; 4],
            feature_names: None,
        }
        .into_scaler()
        .err()
        .unwrap();
        assert!(err.to_string().contains("expected 17"));

        let scaler = standard();
        assert!(matches!(
            scaler.transform(&[1.0; 3]),
            Err(InferenceError::Shape { expected: 17, actual: 3 })
        ));
    }

    #[test]
    fn test_artifact_json_format() {
        let artifact: ScalerArtifact = serde_json::from_value(json!({
            "kind": "standard",
            "mean": vec![0.0; FEATURE_COUNT],
            "scale": vec![1.0; FEATURE_COUNT],
        }))
        .unwrap();
        assert!(matches!(artifact, ScalerArtifact::Standard { .. }));
    }

    #[test]
    fn test_feature_names_must_match_layout() {
        let names: Vec<String> = crate::features::FEATURE_LAYOUT
            .iter()
            .map(|s| s.to_string())
            .collect();

        let ok = ScalerArtifact::MinMax {
            min: vec![0.0; FEATURE_COUNT],
            max: vec![1.0; FEATURE_COUNT],
            feature_names: Some(names.clone()),
        };
        assert!(ok.into_scaler().is_ok());

        let mut swapped = names;
        swapped.swap(0, 1);
        let err = ScalerArtifact::Standard {
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; FEATURE_COUNT],
            feature_names: Some(swapped),
        }
        .into_scaler()
        .err()
        .unwrap();
        assert!(err.to_string().contains("scaler layout mismatch"));
        assert!(err.to_string().contains("`txbytes_rate`"));
    }
}
