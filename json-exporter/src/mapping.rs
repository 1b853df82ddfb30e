//! Mapping from extracted JSON values to Prometheus gauge samples.

use serde_json::Value;
use thiserror::Error;

/// Why an extracted value could not become a gauge sample.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoerceError {
    #[error("string {original:?} does not contain a number")]
    UnparsableString { original: String },

    #[error("{0} values cannot be exported")]
    UnsupportedType(&'static str),

    #[error("value is not finite")]
    NotFinite,
}

/// Coerce an extracted JSON value into a finite `f64`.
///
/// - Numbers are used as is.
/// - Strings have every character other than ASCII digits and `.` removed and
///   the remainder is parsed, so `"23.0C"` becomes `23.0` and `"  5 ms"`
///   becomes `5`. Signs and exponents are removed as well.
/// - Everything else is rejected.
pub fn coerce_value(value: &Value) -> Result<f64, CoerceError> {
    let number = match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or(CoerceError::UnsupportedType("number"))?,
        Value::String(text) => parse_stripped(text)?,
        Value::Null => return Err(CoerceError::UnsupportedType("null")),
        Value::Bool(_) => return Err(CoerceError::UnsupportedType("boolean")),
        Value::Array(_) => return Err(CoerceError::UnsupportedType("array")),
        Value::Object(_) => return Err(CoerceError::UnsupportedType("object")),
    };

    if number.is_finite() {
        Ok(number)
    } else {
        Err(CoerceError::NotFinite)
    }
}

fn parse_stripped(text: &str) -> Result<f64, CoerceError> {
    let stripped: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    stripped
        .parse()
        .map_err(|_| CoerceError::UnparsableString {
            original: text.to_string(),
        })
}

/// Check a metric name against `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == ':' => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
