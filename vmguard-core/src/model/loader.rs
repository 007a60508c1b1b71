//! Artifact loader
//!
//! Scaler and model are read once at startup. JSON is the default
//! format; `.onnx` models need the `onnx` cargo feature.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::classifier::{Classifier, MlpArtifact, MlpClassifier};
use super::decision::DecisionRule;
use super::inference::Predictor;
use super::scaler::{Scaler, ScalerArtifact};

/// Load a fitted scaler from a JSON artifact
pub fn load_scaler<P: AsRef<Path>>(path: P) -> Result<Arc<dyn Scaler>> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading scaler");

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scaler from {}", path.display()))?;
    let artifact: ScalerArtifact = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse scaler {}", path.display()))?;
    let scaler = artifact
        .into_scaler()
        .with_context(|| format!("Invalid scaler {}", path.display()))?;

    info!(kind = scaler.kind(), "Scaler loaded");
    Ok(Arc::from(scaler))
}

/// Load a trained classifier, picking the backend by file extension
pub fn load_classifier<P: AsRef<Path>>(path: P) -> Result<Arc<dyn Classifier>> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading model");

    let is_onnx = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("onnx"))
        .unwrap_or(false);

    let classifier: Arc<dyn Classifier> = if is_onnx {
        load_onnx(path)?
    } else {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model from {}", path.display()))?;
        let artifact: MlpArtifact = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse model {}", path.display()))?;
        let model = MlpClassifier::try_from(artifact)
            .with_context(|| format!("Invalid model {}", path.display()))?;
        Arc::new(model)
    };

    info!(model = classifier.name(), "Model loaded successfully");
    Ok(classifier)
}

#[cfg(feature = "onnx")]
fn load_onnx(path: &Path) -> Result<Arc<dyn Classifier>> {
    Ok(Arc::new(super::onnx::OnnxClassifier::load(path)?))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(path: &Path) -> Result<Arc<dyn Classifier>> {
    anyhow::bail!(
        "{} is an ONNX model but this build lacks the `onnx` feature",
        path.display()
    )
}

/// Load both artifacts and assemble the shared predictor
pub fn load_predictor<P: AsRef<Path>, Q: AsRef<Path>>(
    model_path: P,
    scaler_path: Q,
    rule: DecisionRule,
) -> Result<Predictor> {
    let scaler = load_scaler(scaler_path)?;
    let classifier = load_classifier(model_path)?;
    Ok(Predictor::new(scaler, classifier, rule))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureVector, RawValue, FEATURE_COUNT, FEATURE_LAYOUT};
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn write_artifacts(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        let model_path = dir.join("ffnn_model_n.json");
        let scaler_path = dir.join("scaler_n.json");

        fs::write(
            &model_path,
            json!({
                "name": "ffnn_model_n",
                "hidden_activation": "relu",
                "layers": [
                    { "weights": vec![vec![0.5, 0.0]; FEATURE_COUNT], "biases": [0.0, 0.1] },
                    { "weights": [[1.0], [1.0]], "biases": [-0.1] }
                ]
            })
            .to_string(),
        )
        .unwrap();

        fs::write(
            &scaler_path,
            json!({
                "kind": "standard",
                "mean": vec![0.0; FEATURE_COUNT],
                "scale": vec![1.0; FEATURE_COUNT],
            })
            .to_string(),
        )
        .unwrap();

        (model_path, scaler_path)
    }

    #[test]
    fn test_load_predictor_from_json() {
        let dir = tempdir().unwrap();
        let (model_path, scaler_path) = write_artifacts(dir.path());

        let predictor = load_predictor(&model_path, &scaler_path, DecisionRule::default()).unwrap();
        let result = predictor
            .predict(&FeatureVector::from_values([0.0; FEATURE_COUNT]))
            .unwrap();

        // hidden = [0, 0.1], output = 0.1 - 0.1 = 0
        assert_eq!(result.probability, 0.5);
        assert_eq!(predictor.status().model_name, "ffnn_model_n");
    }

    #[test]
    fn test_missing_file_has_context() {
        let dir = tempdir().unwrap();
        let err = load_scaler(dir.path().join("nope.json")).err().unwrap();
        assert!(err.to_string().contains("Failed to read scaler"));
    }

    #[test]
    fn test_malformed_artifact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scaler.json");
        fs::write(&path, r#"{"kind":"robust"}"#).unwrap();
        let err = load_scaler(&path).err().unwrap();
        assert!(err.to_string().contains("Failed to parse scaler"));
    }

    #[test]
    fn test_reordered_scaler_is_rejected_at_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scaler.json");

        let mut names: Vec<&str> = FEATURE_LAYOUT.to_vec();
        names.swap(9, 10);
        fs::write(
            &path,
            json!({
                "kind": "standard",
                "feature_names": names,
                "mean": vec![0.0; FEATURE_COUNT],
                "scale": vec![1.0; FEATURE_COUNT],
            })
            .to_string(),
        )
        .unwrap();

        let err = load_scaler(&path).err().unwrap();
        let message = format!("{:#}", err);
        assert!(message.contains("Invalid scaler"));
        assert!(message.contains("feature 9 is `memrss`, expected `memlast_update`"));
    }

    #[test]
    fn test_bundled_demo_artifacts() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../artifacts");
        let predictor = load_predictor(
            root.join("ffnn_model_n.json"),
            root.join("scaler_n.json"),
            DecisionRule::default(),
        )
        .unwrap();

        let row: Vec<(&str, &str)> = vec![
            ("rxbytes_rate", "120"),
            ("txbytes_rate", "80"),
            ("timecpu", "0.5"),
            ("timesys", "0.1"),
            ("timeusr", "0.4"),
            ("state", "1"),
            ("cputime", "200"),
            ("memminor_fault", "10"),
            ("memunused", "5000"),
            ("memlast_update", "0"),
            ("memrss", "3000"),
            ("vdard_req_rate", "2"),
            ("vdard_bytes_rate", "1024"),
            ("vdawr_reqs_rate", "1"),
            ("vdawr_bytes_rate", "512"),
            ("hdard_req_rate", "0"),
            ("hdard_bytes_rate", "0"),
        ];
        let vector = FeatureVector::from_lookup(|k| {
            row.iter().find(|(name, _)| *name == k).map(|(_, v)| RawValue::Text(v))
        })
        .unwrap();

        let result = predictor.predict(&vector).unwrap();
        // The demo scaler is centred on this row, so only the biases contribute
        assert!((result.probability - 0.453878).abs() < 1e-6);
        assert_eq!(result.predicted_class, 0);
        assert_eq!(predictor.status().model_name, "ffnn_model_n");
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_onnx_requires_feature() {
        let err = load_classifier("model.onnx").err().unwrap();
        assert!(err.to_string().contains("`onnx` feature"));
    }
}
