//! Presence and domain checks for incoming applicant records.
//!
//! Checks run in a fixed order and stop at the first failure: required fields
//! first (in [`REQUIRED_FIELDS`] order), then the range rules for
//! `credit_score`, `income`, `dti_ratio` and `default_history`.

use serde_json::{Map, Value};
use thiserror::Error;

/// Fields every applicant record must carry, in check order.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "credit_score",
    "credit_history_length",
    "income",
    "dti_ratio",
    "default_history",
    "home_ownership",
    "loan_purpose",
];

pub const CREDIT_SCORE_MIN: f64 = 300.0;
pub const CREDIT_SCORE_MAX: f64 = 900.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("{field} must be a {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("{field} {rule}")]
    OutOfRange {
        field: &'static str,
        rule: &'static str,
    },
}

/// Validate a raw applicant record.
///
/// Returns the first failing check. Optional audit-only fields (`name`,
/// `email`, `age`, `gender`) are not inspected here.
pub fn validate(raw: &Value) -> Result<(), ValidationError> {
    let obj = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    if let Some(field) = REQUIRED_FIELDS.into_iter().find(|f| !obj.contains_key(*f)) {
        return Err(ValidationError::MissingField(field));
    }

    let credit_score = number(obj, "credit_score")?;
    if !(CREDIT_SCORE_MIN..=CREDIT_SCORE_MAX).contains(&credit_score) {
        return Err(ValidationError::OutOfRange {
            field: "credit_score",
            rule: "out of range",
        });
    }

    if number(obj, "income")? <= 0.0 {
        return Err(ValidationError::OutOfRange {
            field: "income",
            rule: "must be positive",
        });
    }

    if !(0.0..=1.0).contains(&number(obj, "dti_ratio")?) {
        return Err(ValidationError::OutOfRange {
            field: "dti_ratio",
            rule: "must be between 0 and 1",
        });
    }

    let default_history = number(obj, "default_history")?;
    if default_history != 0.0 && default_history != 1.0 {
        return Err(ValidationError::OutOfRange {
            field: "default_history",
            rule: "must be 0 or 1",
        });
    }

    Ok(())
}

pub(crate) fn number(obj: &Map<String, Value>, field: &'static str) -> Result<f64, ValidationError> {
    obj.get(field)
        .ok_or(ValidationError::MissingField(field))?
        .as_f64()
        .ok_or(ValidationError::InvalidType {
            field,
            expected: "number",
        })
}

pub(crate) fn text(obj: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    obj.get(field)
        .ok_or(ValidationError::MissingField(field))?
        .as_str()
        .map(str::to_string)
        .ok_or(ValidationError::InvalidType {
            field,
            expected: "string",
        })
}
