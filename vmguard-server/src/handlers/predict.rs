//! Prediction handlers

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use vmguard_core::explain::explain_or_placeholder;
use vmguard_core::{Explanation, FeatureContribution, Prediction};

use crate::input::PredictInput;
use crate::views::FormPage;
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct PredictQuery {
    /// Attach `top_features` to JSON responses
    #[serde(default)]
    pub explain: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: u8,
    pub probability: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_features: Option<Vec<FeatureContribution>>,
}

impl PredictResponse {
    fn new(prediction: &Prediction, explanation: Option<&Explanation>) -> Self {
        Self {
            prediction: prediction.predicted_class,
            probability: (prediction.probability * 1e6).round() / 1e6,
            top_features: explanation.map(Explanation::contributions),
        }
    }
}

/// Blank input form
pub async fn index(State(state): State<AppState>) -> AppResult<Html<String>> {
    state.pages.render_form(&FormPage::empty())
}

/// Predict from a browser form (HTML) or a JSON body (JSON)
pub async fn predict(
    State(state): State<AppState>,
    query: Result<Query<PredictQuery>, QueryRejection>,
    input: PredictInput,
) -> AppResult<Response> {
    let Query(query) = query.map_err(|e| AppError::InvalidQuery(e.body_text()))?;
    let vector = input.to_vector()?;
    tracing::debug!(features = %vector.to_log_entry(), "Decoded feature vector");

    let scaled = state.predictor.scale(&vector)?;
    let prediction = state.predictor.predict_scaled(&scaled)?;

    tracing::info!(
        json = input.is_json(),
        predicted_class = prediction.predicted_class,
        probability = prediction.probability,
        "Prediction served"
    );

    let wants_explanation = !input.is_json() || query.explain;
    let explanation = if wants_explanation {
        explain(&state, scaled).await
    } else {
        None
    };

    if input.is_json() {
        let body = PredictResponse::new(&prediction, explanation.as_ref());
        return Ok(Json(body).into_response());
    }

    let mut page = FormPage::with_values(|name| input.display_value(name)).with_prediction(&prediction);
    if let Some(explanation) = &explanation {
        page = page.with_explanation(explanation);
    }
    Ok(state.pages.render_form(&page)?.into_response())
}

/// Attribution on the blocking pool; always yields a value when an explainer is configured
async fn explain(state: &AppState, scaled: Vec<f64>) -> Option<Explanation> {
    let explainer = state.explainer.clone()?;
    let predictor = state.predictor.clone();
    let top_n = state.config.top_n;

    let handle = tokio::task::spawn_blocking(move || {
        explain_or_placeholder(explainer.as_ref(), &scaled, predictor.classifier(), top_n)
    });

    let explanation = match handle.await {
        Ok(explanation) => explanation,
        Err(e) => {
            tracing::warn!(error = %e, "Explanation task failed");
            Explanation::Failed {
                reason: e.to_string(),
            }
        }
    };
    Some(explanation)
}
