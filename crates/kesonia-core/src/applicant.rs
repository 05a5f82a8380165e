//! Applicant attributes as received on the decision path.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lenient;
use crate::validation::{self, ValidationError, number, text};

/// A validated applicant record. Lives for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub credit_score: f64,
    pub credit_history_length: f64,
    pub income: f64,
    pub dti_ratio: f64,
    pub default_history: f64,
    pub home_ownership: String,
    pub loan_purpose: String,
    /// Audit-only fields.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub age: Option<f64>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl ApplicantRecord {
    /// Validate a raw JSON body and convert it into a typed record.
    pub fn from_json(raw: &Value) -> Result<Self, ValidationError> {
        validation::validate(raw)?;
        let obj = raw.as_object().ok_or(ValidationError::NotAnObject)?;

        Ok(Self {
            credit_score: number(obj, "credit_score")?,
            credit_history_length: number(obj, "credit_history_length")?,
            income: number(obj, "income")?,
            dti_ratio: number(obj, "dti_ratio")?,
            default_history: number(obj, "default_history")?,
            home_ownership: text(obj, "home_ownership")?,
            loan_purpose: text(obj, "loan_purpose")?,
            name: optional_text(obj, "name"),
            email: optional_text(obj, "email"),
            age: obj.get("age").and_then(Value::as_f64),
            gender: optional_text(obj, "gender"),
        })
    }

    /// Numeric attributes keyed by their training-time column names.
    pub fn numeric_columns(&self) -> Vec<(&'static str, f64)> {
        let mut columns = vec![
            ("credit_score", self.credit_score),
            ("credit_history_length", self.credit_history_length),
            ("income", self.income),
            ("dti_ratio", self.dti_ratio),
            ("default_history", self.default_history),
        ];
        if let Some(age) = self.age {
            columns.push(("age", age));
        }
        columns
    }

    /// Value of a categorical attribute, by field name.
    pub fn category(&self, field: &str) -> Option<&str> {
        match field {
            "home_ownership" => Some(&self.home_ownership),
            "loan_purpose" => Some(&self.loan_purpose),
            _ => None,
        }
    }
}

fn optional_text(obj: &Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Applicant attributes as they appear in an audit row.
///
/// Absent values fall back to `""` / `0`, so the same shape serves both the
/// decision path and the finalize path (where the client echoes the fields).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicantSummary {
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub email: String,
    #[serde(deserialize_with = "lenient::number")]
    pub age: f64,
    #[serde(deserialize_with = "lenient::text")]
    pub gender: String,
    #[serde(deserialize_with = "lenient::number")]
    pub credit_score: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub credit_history_length: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub income: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub dti_ratio: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub default_history: f64,
    #[serde(deserialize_with = "lenient::text")]
    pub home_ownership: String,
    #[serde(deserialize_with = "lenient::text")]
    pub loan_purpose: String,
}

impl From<&ApplicantRecord> for ApplicantSummary {
    fn from(record: &ApplicantRecord) -> Self {
        Self {
            name: record.name.clone().unwrap_or_default(),
            email: record.email.clone().unwrap_or_default(),
            age: record.age.unwrap_or_default(),
            gender: record.gender.clone().unwrap_or_default(),
            credit_score: record.credit_score,
            credit_history_length: record.credit_history_length,
            income: record.income,
            dti_ratio: record.dti_ratio,
            default_history: record.default_history,
            home_ownership: record.home_ownership.clone(),
            loan_purpose: record.loan_purpose.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_reads_required_and_optional_fields() {
        let raw = json!({
            "credit_score": 720,
            "credit_history_length": 8,
            "income": 52000.5,
            "dti_ratio": 0.31,
            "default_history": 1,
            "home_ownership": "MORTGAGE",
            "loan_purpose": "EDUCATION",
            "name": "Sam Doe",
            "age": 41
        });

        let record = ApplicantRecord::from_json(&raw).unwrap();
        assert_eq!(record.credit_score, 720.0);
        assert_eq!(record.income, 52000.5);
        assert_eq!(record.home_ownership, "MORTGAGE");
        assert_eq!(record.name.as_deref(), Some("Sam Doe"));
        assert_eq!(record.age, Some(41.0));
        assert!(record.email.is_none());
    }

    #[test]
    fn from_json_runs_validation_first() {
        let raw = json!({ "credit_score": 720 });
        let err = ApplicantRecord::from_json(&raw).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("credit_history_length"));
    }

    #[test]
    fn categorical_must_be_text() {
        let raw = json!({
            "credit_score": 720,
            "credit_history_length": 8,
            "income": 52000,
            "dti_ratio": 0.31,
            "default_history": 0,
            "home_ownership": 3,
            "loan_purpose": "EDUCATION"
        });
        let err = ApplicantRecord::from_json(&raw).unwrap_err();
        assert_eq!(err.to_string(), "home_ownership must be a string");
    }

    #[test]
    fn numeric_columns_include_age_only_when_present() {
        let mut record = ApplicantRecord {
            credit_score: 700.0,
            credit_history_length: 3.0,
            income: 1000.0,
            dti_ratio: 0.1,
            default_history: 0.0,
            home_ownership: "OWN".into(),
            loan_purpose: "VENTURE".into(),
            name: None,
            email: None,
            age: None,
            gender: None,
        };
        assert_eq!(record.numeric_columns().len(), 5);

        record.age = Some(30.0);
        assert!(record.numeric_columns().contains(&("age", 30.0)));
    }

    #[test]
    fn summary_defaults_missing_audit_fields() {
        let raw = json!({
            "credit_score": 650,
            "credit_history_length": 2,
            "income": 30000,
            "dti_ratio": 0.5,
            "default_history": 0,
            "home_ownership": "RENT",
            "loan_purpose": "MEDICAL"
        });
        let record = ApplicantRecord::from_json(&raw).unwrap();
        let summary = ApplicantSummary::from(&record);
        assert_eq!(summary.name, "");
        assert_eq!(summary.age, 0.0);
        assert_eq!(summary.loan_purpose, "MEDICAL");
    }
}
