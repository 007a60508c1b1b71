//! Numeric cleaner for free-form telemetry fields
//!
//! Form posts and hand-written JSON carry values like `"1,024 B"` or
//! `" 0.5% "`. Everything except ASCII digits, `-` and `.` is dropped
//! before parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use std::num::ParseFloatError;
use thiserror::Error;

static NON_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9.\-]").expect("static regex is valid"));

/// Cleaned remainders that carry no number at all
const DEGENERATE: [&str; 4] = ["", "-", ".", "-."];

fn is_degenerate(s: &str) -> bool {
    DEGENERATE.contains(&s)
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CleanError {
    #[error("could not convert string to float: '{raw}' has no numeric content")]
    NoNumericContent { raw: String },

    #[error("could not convert string to float: '{cleaned}' ({source})")]
    Unparsable {
        cleaned: String,
        source: ParseFloatError,
    },
}

/// Strip a raw value down to its numeric characters and parse it.
///
/// Degenerate remainders (`""`, `"-"`, `"."`, `"-."`) become `0.0`.
pub fn clean_numeric(raw: &str) -> Result<f64, CleanError> {
    let cleaned = NON_NUMERIC.replace_all(raw, "");

    if is_degenerate(&cleaned) {
        return Ok(0.0);
    }

    cleaned.parse::<f64>().map_err(|source| CleanError::Unparsable {
        cleaned: cleaned.into_owned(),
        source,
    })
}

/// Coerce one request field.
///
/// Same as [`clean_numeric`], except a value made only of non-numeric
/// characters (`"abc"`, `"N/A"`) is rejected instead of read as zero.
/// Blank fields still read as `0.0`.
pub fn coerce_feature(raw: &str) -> Result<f64, CleanError> {
    let trimmed = raw.trim();
    let cleaned = NON_NUMERIC.replace_all(trimmed, "");

    if is_degenerate(&cleaned) && !is_degenerate(trimmed) {
        return Err(CleanError::NoNumericContent {
            raw: raw.to_string(),
        });
    }

    clean_numeric(trimmed)
}
