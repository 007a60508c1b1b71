//! VM Guard Server
//!
//! HTTP front end for the VM attack detector.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     VM GUARD SERVER                      │
//! ├──────────────────────────────────────────────────────────┤
//! │  POST /predict                                           │
//! │    PredictInput (form | json)                            │
//! │        └─► FeatureVector ─► Predictor ─► Prediction      │
//! │                                  └─► Explainer (blocking │
//! │                                      pool, optional)     │
//! │    ─► JSON body  or  rendered HTML page                  │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod input;
pub mod views;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use vmguard_core::explain::{Explainer, LimeExplainer, OcclusionExplainer};
use vmguard_core::Predictor;

pub use config::{Config, ExplainerKind};
pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub explainer: Option<Arc<dyn Explainer>>,
    pub pages: Arc<views::Pages>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, predictor: Predictor) -> anyhow::Result<Self> {
        let explainer: Option<Arc<dyn Explainer>> = match config.explainer {
            ExplainerKind::Occlusion => Some(Arc::new(OcclusionExplainer)),
            ExplainerKind::Lime => Some(Arc::new(
                LimeExplainer::new(config.lime_samples).with_seed(config.lime_seed),
            )),
            ExplainerKind::Disabled => None,
        };

        Ok(Self {
            predictor: Arc::new(predictor),
            explainer,
            pages: Arc::new(views::Pages::new()?),
            config,
        })
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::predict::index))
        .route("/predict", post(handlers::predict::predict))
        .route("/health", get(handlers::health::check))
        .route("/api/v1/model", get(handlers::model::status))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
