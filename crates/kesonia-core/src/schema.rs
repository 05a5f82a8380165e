//! Training-time feature schemas and the column vocabulary they draw on.

use std::collections::HashSet;

use arrow::datatypes::{DataType, Field, Schema};
use serde::{Deserialize, Serialize};

/// Categorical fields expanded into drop-first indicator columns.
pub const CATEGORICAL_FIELDS: [&str; 2] = ["home_ownership", "loan_purpose"];

/// Columns log1p-transformed before scaling in the classification and
/// regression pipelines.
pub const LOG_COLUMNS: [&str; 2] = ["income", "dti_ratio"];

/// Columns the classification and regression scalers were fitted on.
pub const SCALE_COLUMNS: [&str; 4] = [
    "credit_score",
    "income",
    "dti_ratio",
    "credit_history_length",
];

/// Synthetic kesonic column carrying the predicted loan amount.
pub const LOAN_AMOUNT_COLUMN: &str = "loan_amount";
/// Synthetic kesonic column; the request does not collect it.
pub const EMPLOYMENT_LENGTH_COLUMN: &str = "employment_length";
pub const EMPLOYMENT_LENGTH_PLACEHOLDER: f64 = 5.0;

/// Numeric columns the feature builder can produce from a request.
pub const NUMERIC_COLUMNS: [&str; 8] = [
    "credit_score",
    "credit_history_length",
    "income",
    "dti_ratio",
    "default_history",
    "age",
    LOAN_AMOUNT_COLUMN,
    EMPLOYMENT_LENGTH_COLUMN,
];

/// Name of the indicator column for `level` of a categorical `field`.
pub fn indicator_column(field: &str, level: &str) -> String {
    format!("{field}_{level}")
}

/// Ordered column names a model was trained on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.position(column).is_some()
    }

    /// First column name that appears more than once, if any.
    pub fn duplicate(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.columns.len());
        self.columns
            .iter()
            .find(|c| !seen.insert(c.as_str()))
            .map(String::as_str)
    }

    /// Levels of `field` that have an indicator column, in schema order.
    pub fn indicator_levels(&self, field: &str) -> Vec<&str> {
        let prefix = format!("{field}_");
        self.columns
            .iter()
            .filter_map(|c| c.strip_prefix(&prefix))
            .collect()
    }

    /// Whether `column` is a plain numeric column or an indicator of one of
    /// the categorical fields.
    pub fn is_known_column(column: &str) -> bool {
        NUMERIC_COLUMNS.contains(&column)
            || CATEGORICAL_FIELDS
                .iter()
                .any(|field| column.starts_with(&format!("{field}_")))
    }

    /// Arrow view of the schema: one non-null Float64 field per column.
    pub fn to_arrow(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|c| Field::new(c, DataType::Float64, false))
                .collect::<Vec<_>>(),
        )
    }
}

impl<S: Into<String>> FromIterator<S> for FeatureSchema {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}
