//! Error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use vmguard_core::{FeatureError, InferenceError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client input errors
    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Invalid query string: {0}")]
    InvalidQuery(String),

    // Model errors
    #[error("Prediction failed: {0}")]
    Inference(#[from] InferenceError),

    // Presentation errors
    #[error("Template error: {0}")]
    Render(String),

    // Generic errors
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Feature(_)
            | AppError::InvalidBody(_)
            | AppError::InvalidQuery(_)
            | AppError::Inference(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Render(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            AppError::Feature(err) => {
                tracing::debug!("Rejected input: {}", err);
                err.to_string()
            }
            AppError::InvalidBody(_) | AppError::InvalidQuery(_) => self.to_string(),
            AppError::Inference(err) => {
                tracing::error!("Inference error: {}", err);
                self.to_string()
            }
            AppError::Render(msg) | AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_400() {
        let missing = AppError::from(FeatureError::Missing {
            features: vec!["state".into()],
        });
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            missing.to_string(),
            "Missing one or more required features: state"
        );

        let bad = AppError::from(FeatureError::BadValue {
            feature: "memrss".into(),
            value: "1.2.3".into(),
            reason: "could not convert string to float: '1.2.3'".into(),
        });
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert!(bad.to_string().starts_with("Bad numeric value"));
    }

    #[test]
    fn test_inference_error_is_structured_400() {
        let err = AppError::from(InferenceError::NonFinite);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_errors_are_500() {
        assert_eq!(
            AppError::Render("missing partial".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
