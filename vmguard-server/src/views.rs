//! HTML rendering for the browser form

use axum::response::Html;
use handlebars::Handlebars;
use serde::Serialize;
use vmguard_core::features::{describe, FEATURE_LAYOUT};
use vmguard_core::{Explanation, Prediction};

use crate::{AppError, AppResult};

pub const ATTACK_LABEL: &str = "🚨 Virtual Machine Under Attack";
pub const NORMAL_LABEL: &str = "✅ Virtual Machine Normal";

const INDEX_TEMPLATE: &str = include_str!("../templates/index.hbs");

/// Headline shown above the form, e.g. `✅ Virtual Machine Normal (12.3%) (Prob=0.1230)`
pub fn prediction_label(prediction: &Prediction) -> String {
    let label = if prediction.is_attack() { ATTACK_LABEL } else { NORMAL_LABEL };
    format!(
        "{} ({:.1}%) (Prob={:.4})",
        label,
        prediction.probability * 100.0,
        prediction.probability
    )
}

#[derive(Debug, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub value: String,
    pub description: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ContributionView {
    pub feature: String,
    pub contribution: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FormPage {
    pub fields: Vec<FieldView>,
    pub prediction: Option<String>,
    pub is_attack: bool,
    pub top_features: Vec<ContributionView>,
    pub explanation_failed: bool,
}

impl FormPage {
    /// Blank form
    pub fn empty() -> Self {
        Self::with_values(|_| String::new())
    }

    /// Form with every field pre-filled, in layout order
    pub fn with_values<F>(value_of: F) -> Self
    where
        F: Fn(&str) -> String,
    {
        let fields = FEATURE_LAYOUT
            .iter()
            .map(|&name| FieldView {
                name,
                value: value_of(name),
                description: describe(name),
            })
            .collect();

        Self {
            fields,
            prediction: None,
            is_attack: false,
            top_features: Vec::new(),
            explanation_failed: false,
        }
    }

    pub fn with_prediction(mut self, prediction: &Prediction) -> Self {
        self.prediction = Some(prediction_label(prediction));
        self.is_attack = prediction.is_attack();
        self
    }

    pub fn with_explanation(mut self, explanation: &Explanation) -> Self {
        self.explanation_failed = explanation.is_failed();
        self.top_features = explanation
            .contributions()
            .into_iter()
            .map(|c| ContributionView {
                feature: c.feature,
                contribution: format!("{:+.4}", c.contribution),
                description: c.description,
            })
            .collect();
        self
    }
}

pub struct Pages {
    handlebars: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, handlebars::TemplateError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(escape_html);
        handlebars.register_template_string("index", INDEX_TEMPLATE)?;
        Ok(Self { handlebars })
    }

    pub fn render_form(&self, page: &FormPage) -> AppResult<Html<String>> {
        self.handlebars
            .render("index", page)
            .map(Html)
            .map_err(|e| AppError::Render(e.to_string()))
    }
}

/// Escapes markup and quotes only, so labels like `Prob=0.5` render verbatim
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
