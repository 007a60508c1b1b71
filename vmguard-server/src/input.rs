//! Request decoding for `/predict`
//!
//! The body is resolved once into a tagged variant. Everything after
//! that works on the canonical `FeatureVector`.

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderMap},
    Form,
};
use serde_json::{Map, Value};
use vmguard_core::features::{FeatureError, FeatureVector, RawValue};

use crate::AppError;

#[derive(Debug, Clone)]
pub enum PredictInput {
    /// `application/json` (or `*+json`) object
    Json(Map<String, Value>),
    /// `application/x-www-form-urlencoded` browser form
    Form(HashMap<String, String>),
}

impl PredictInput {
    pub fn is_json(&self) -> bool {
        matches!(self, PredictInput::Json(_))
    }

    /// Canonical ordered row
    pub fn to_vector(&self) -> Result<FeatureVector, FeatureError> {
        match self {
            PredictInput::Json(map) => FeatureVector::from_lookup(|k| map.get(k).map(RawValue::Json)),
            PredictInput::Form(fields) => {
                FeatureVector::from_lookup(|k| fields.get(k).map(|v| RawValue::Text(v)))
            }
        }
    }

    /// Submitted text for a field, for echoing back into the form
    pub fn display_value(&self, name: &str) -> String {
        match self {
            PredictInput::Json(map) => map.get(name).map(|v| RawValue::Json(v).display()),
            PredictInput::Form(fields) => fields.get(name).cloned(),
        }
        .unwrap_or_default()
    }
}

fn is_json_content(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

#[async_trait]
impl<S> FromRequest<S> for PredictInput
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_json_content(req.headers()) {
            let axum::Json(body) = axum::Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| AppError::InvalidBody(e.body_text()))?;

            match body {
                Value::Object(map) => Ok(PredictInput::Json(map)),
                other => Err(AppError::InvalidBody(format!(
                    "expected a JSON object of features, got {}",
                    json_kind(&other)
                ))),
            }
        } else {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| AppError::InvalidBody(e.body_text()))?;
            Ok(PredictInput::Form(fields))
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn test_json_content_detection() {
        assert!(is_json_content(&headers("application/json")));
        assert!(is_json_content(&headers("application/json; charset=utf-8")));
        assert!(is_json_content(&headers("application/vnd.api+json")));
        assert!(!is_json_content(&headers("application/x-www-form-urlencoded")));
        assert!(!is_json_content(&headers("text/plain")));
        assert!(!is_json_content(&HeaderMap::new()));
    }

    #[test]
    fn test_display_value() {
        let input = PredictInput::Json(
            json!({ "state": 1, "memrss": "3,000", "timesys": null })
                .as_object()
                .unwrap()
                .clone(),
        );
        assert_eq!(input.display_value("state"), "1");
        assert_eq!(input.display_value("memrss"), "3,000");
        assert_eq!(input.display_value("timesys"), "");
        assert_eq!(input.display_value("cputime"), "");
        assert!(input.is_json());
    }
}
