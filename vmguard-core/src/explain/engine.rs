//! Attribution engines
//!
//! Both engines work in scaled space, around the row the classifier
//! actually saw.

use std::any::Any;
use std::cmp::Ordering;
use std::f64::consts::PI;
use std::panic::{catch_unwind, AssertUnwindSafe};

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::{ExplainError, Explanation, FeatureContribution};
use crate::features::{describe, feature_name, FEATURE_COUNT};
use crate::model::{Classifier, InferenceError};

pub const DEFAULT_TOP_N: usize = 5;

pub trait Explainer: Send + Sync {
    fn method(&self) -> &'static str;

    /// Raw per-feature attribution, in layout order
    fn attribute(&self, scaled: &[f64], model: &dyn Classifier) -> Result<Vec<f64>, ExplainError>;

    /// Top `top_n` attributions by magnitude
    fn explain(
        &self,
        scaled: &[f64],
        model: &dyn Classifier,
        top_n: usize,
    ) -> Result<Vec<FeatureContribution>, ExplainError> {
        let raw = self.attribute(scaled, model)?;
        rank(&raw, top_n)
    }
}

/// Sort by |contribution| descending and keep the first `top_n`
pub fn rank(raw: &[f64], top_n: usize) -> Result<Vec<FeatureContribution>, ExplainError> {
    let mut contributions = Vec::with_capacity(raw.len());

    for (i, &value) in raw.iter().enumerate() {
        let name = feature_name(i).unwrap_or("unknown");
        if !value.is_finite() {
            return Err(ExplainError::NonFinite(name.to_string()));
        }
        contributions.push(FeatureContribution {
            feature: name.to_string(),
            contribution: value,
            description: describe(name).map(str::to_string),
        });
    }

    contributions.sort_by(|a, b| {
        b.contribution
            .abs()
            .partial_cmp(&a.contribution.abs())
            .unwrap_or(Ordering::Equal)
    });
    contributions.truncate(top_n);

    Ok(contributions)
}

/// Run an explainer and degrade to a placeholder on any failure, panics included
pub fn explain_or_placeholder(
    explainer: &dyn Explainer,
    scaled: &[f64],
    model: &dyn Classifier,
    top_n: usize,
) -> Explanation {
    let outcome = catch_unwind(AssertUnwindSafe(|| explainer.explain(scaled, model, top_n)))
        .unwrap_or_else(|payload| Err(ExplainError::Panicked(panic_message(&*payload))));

    match outcome {
        Ok(contributions) => Explanation::Ranked {
            method: explainer.method().to_string(),
            contributions,
        },
        Err(e) => {
            tracing::warn!(method = explainer.method(), error = %e, "Explanation failed");
            Explanation::Failed {
                reason: e.to_string(),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn check_width(scaled: &[f64]) -> Result<(), ExplainError> {
    if scaled.len() != FEATURE_COUNT {
        return Err(InferenceError::Shape {
            expected: FEATURE_COUNT,
            actual: scaled.len(),
        }
        .into());
    }
    Ok(())
}

// ============================================================================
// OCCLUSION (SHAP-style baseline substitution)
// ============================================================================

/// `f(x) - f(x with feature i set to 0)`
///
/// Zero is the training mean once the standard scaler has been applied.
#[derive(Debug, Clone, Default)]
pub struct OcclusionExplainer;

impl Explainer for OcclusionExplainer {
    fn method(&self) -> &'static str {
        "occlusion"
    }

    fn attribute(&self, scaled: &[f64], model: &dyn Classifier) -> Result<Vec<f64>, ExplainError> {
        check_width(scaled)?;

        let full = model.predict_proba(scaled)?;
        let mut probe = scaled.to_vec();
        let mut out = Vec::with_capacity(FEATURE_COUNT);

        for i in 0..FEATURE_COUNT {
            let original = probe[i];
            probe[i] = 0.0;
            out.push(full - model.predict_proba(&probe)?);
            probe[i] = original;
        }

        Ok(out)
    }
}

// ============================================================================
// LIME (local weighted linear surrogate)
// ============================================================================

#[derive(Debug, Clone)]
pub struct LimeExplainer {
    samples: usize,
    kernel_width: f64,
    alpha: f64,
    seed: u64,
}

impl Default for LimeExplainer {
    fn default() -> Self {
        Self {
            samples: 500,
            kernel_width: 0.75 * (FEATURE_COUNT as f64).sqrt(),
            alpha: 1.0,
            seed: 42,
        }
    }
}

impl LimeExplainer {
    pub fn new(samples: usize) -> Self {
        Self {
            samples: samples.max(FEATURE_COUNT + 1),
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Explainer for LimeExplainer {
    fn method(&self) -> &'static str {
        "lime"
    }

    fn attribute(&self, scaled: &[f64], model: &dyn Classifier) -> Result<Vec<f64>, ExplainError> {
        check_width(scaled)?;

        let n = FEATURE_COUNT;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut offsets = Array2::<f64>::zeros((self.samples, n));
        let mut targets = Array1::<f64>::zeros(self.samples);
        let mut weights = Array1::<f64>::zeros(self.samples);
        let mut probe = vec![0.0; n];
        let width2 = self.kernel_width * self.kernel_width;

        for s in 0..self.samples {
            // Row 0 is the instance itself
            if s > 0 {
                for j in 0..n {
                    offsets[[s, j]] = standard_normal(&mut rng);
                }
            }

            let row = offsets.row(s);
            for j in 0..n {
                probe[j] = scaled[j] + row[j];
            }
            targets[s] = model.predict_proba(&probe)?;
            weights[s] = (-row.dot(&row) / width2).exp().sqrt();
        }

        weighted_ridge(&offsets, &targets, &weights, self.alpha)
    }
}

fn standard_normal(rng: &mut StdRng) -> f64 {
    // Box-Muller
    let u1: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Ridge regression with intercept on weighted, centered data
fn weighted_ridge(
    x: &Array2<f64>,
    y: &Array1<f64>,
    w: &Array1<f64>,
    alpha: f64,
) -> Result<Vec<f64>, ExplainError> {
    let n = x.ncols();
    let total = w.sum();
    let x_mean = x.t().dot(w) / total;
    let y_mean = y.dot(w) / total;

    let mut a = Array2::<f64>::eye(n) * alpha;
    let mut b = Array1::<f64>::zeros(n);

    for ((row, &yi), &wi) in x.outer_iter().zip(y.iter()).zip(w.iter()) {
        let xc = &row - &x_mean;
        let yc = yi - y_mean;
        for j in 0..n {
            b[j] += wi * xc[j] * yc;
            for k in 0..n {
                a[[j, k]] += wi * xc[j] * xc[k];
            }
        }
    }

    solve(a, b).ok_or(ExplainError::Singular)
}

/// Gaussian elimination with partial pivoting
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            a[[i, col]]
                .abs()
                .partial_cmp(&a[[j, col]].abs())
                .unwrap_or(Ordering::Equal)
        })?;
        if a[[pivot, col]].abs() < 1e-12 {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }

        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut acc = b[row];
        for k in row + 1..n {
            acc -= a[[row, k]] * x[k];
        }
        x[row] = acc / a[[row, row]];
    }
    Some(x)
}
