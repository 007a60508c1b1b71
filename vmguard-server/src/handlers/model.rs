//! Model status handler

use axum::{extract::State, Json};
use serde::Serialize;
use vmguard_core::features::LayoutInfo;
use vmguard_core::model::EngineStatus;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ModelStatusResponse {
    pub engine: EngineStatus,
    pub layout: LayoutInfo,
    pub explainer: Option<&'static str>,
    pub top_n: usize,
}

/// Loaded model, decision rule and the feature contract callers must match
pub async fn status(State(state): State<AppState>) -> Json<ModelStatusResponse> {
    Json(ModelStatusResponse {
        engine: state.predictor.status(),
        layout: LayoutInfo::current(),
        explainer: state.explainer.as_ref().map(|e| e.method()),
        top_n: state.config.top_n,
    })
}
