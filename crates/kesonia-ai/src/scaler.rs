//! Fitted feature scalers.
//!
//! Parameters are fixed at training time and exported alongside the models.
//! Both kinds are per-column affine maps over their own ordered column list:
//!
//! - `standard`: `(x - mean) / scale`
//! - `min_max`: `x * scale + min` (the exported `scale_` / `min_` pair)

use kesonia_core::FeatureSchema;
use serde::{Deserialize, Serialize};

use crate::PipelineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    Standard {
        columns: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    MinMax {
        columns: Vec<String>,
        min: Vec<f64>,
        scale: Vec<f64>,
    },
}

impl Scaler {
    /// Identity standardization over `columns`.
    pub fn identity(columns: Vec<String>) -> Self {
        let n = columns.len();
        Self::Standard {
            columns,
            mean: vec![0.0; n],
            scale: vec![1.0; n],
        }
    }

    /// Columns the scaler was fitted on, in fit order.
    pub fn columns(&self) -> &[String] {
        match self {
            Self::Standard { columns, .. } | Self::MinMax { columns, .. } => columns,
        }
    }

    /// Check parameter shapes and values.
    pub fn check(&self) -> Result<(), PipelineError> {
        let (columns, offsets, scales) = match self {
            Self::Standard {
                columns,
                mean,
                scale,
            } => (columns, mean, scale),
            Self::MinMax {
                columns,
                min,
                scale,
            } => (columns, min, scale),
        };

        if offsets.len() != columns.len() || scales.len() != columns.len() {
            return Err(PipelineError::SchemaMismatch(format!(
                "scaler has {} columns but {} offsets and {} scales",
                columns.len(),
                offsets.len(),
                scales.len()
            )));
        }
        if let Some(i) = offsets.iter().position(|v| !v.is_finite()) {
            return Err(PipelineError::SchemaMismatch(format!(
                "scaler offset for '{}' is not finite",
                columns[i]
            )));
        }
        if let Some(i) = scales.iter().position(|v| !v.is_finite() || *v == 0.0) {
            return Err(PipelineError::SchemaMismatch(format!(
                "scaler scale for '{}' must be finite and non-zero",
                columns[i]
            )));
        }
        Ok(())
    }

    /// Scale the `index`-th fitted column.
    fn apply(&self, index: usize, x: f64) -> f64 {
        match self {
            Self::Standard { mean, scale, .. } => (x - mean[index]) / scale[index],
            Self::MinMax { min, scale, .. } => x * scale[index] + min[index],
        }
    }

    /// Scale the fitted columns of `row` in place; other columns pass through.
    ///
    /// `row` must conform to `schema`. Fails with `SchemaMismatch` if a fitted
    /// column is absent from the schema.
    pub fn transform(&self, row: &mut [f64], schema: &FeatureSchema) -> Result<(), PipelineError> {
        for (index, column) in self.columns().iter().enumerate() {
            let pos = schema.position(column).ok_or_else(|| {
                PipelineError::SchemaMismatch(format!("scaled column '{column}' not in schema"))
            })?;
            row[pos] = self.apply(index, row[pos]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        ["credit_score", "default_history", "income"].into_iter().collect()
    }

    #[test]
    fn standard_scales_only_fitted_columns() {
        let scaler = Scaler::Standard {
            columns: vec!["income".into(), "credit_score".into()],
            mean: vec![10.0, 600.0],
            scale: vec![2.0, 100.0],
        };
        let mut row = [750.0, 1.0, 11.0];
        scaler.transform(&mut row, &schema()).unwrap();
        assert_eq!(row, [1.5, 1.0, 0.5]);
    }

    #[test]
    fn min_max_uses_exported_min_and_scale() {
        let scaler = Scaler::MinMax {
            columns: vec!["credit_score".into()],
            min: vec![-0.5],
            scale: vec![1.0 / 600.0],
        };
        let mut row = [600.0, 0.0, 3.0];
        scaler.transform(&mut row, &schema()).unwrap();
        assert!((row[0] - 0.5).abs() < 1e-12);
        assert_eq!(row[2], 3.0);
    }

    #[test]
    fn missing_column_is_schema_mismatch() {
        let scaler = Scaler::identity(vec!["dti_ratio".into()]);
        let mut row = [0.0; 3];
        let err = scaler.transform(&mut row, &schema()).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch(_)));
    }

    #[test]
    fn check_rejects_bad_parameters() {
        let short = Scaler::Standard {
            columns: vec!["income".into(), "credit_score".into()],
            mean: vec![0.0],
            scale: vec![1.0, 1.0],
        };
        assert!(short.check().is_err());

        let zero = Scaler::Standard {
            columns: vec!["income".into()],
            mean: vec![0.0],
            scale: vec![0.0],
        };
        assert!(zero.check().is_err());

        assert!(Scaler::identity(vec!["income".into()]).check().is_ok());
    }

    #[test]
    fn deserializes_tagged_json() {
        let scaler: Scaler = serde_json::from_str(
            r#"{"kind":"min_max","columns":["income"],"min":[0.0],"scale":[0.5]}"#,
        )
        .unwrap();
        assert_eq!(scaler.columns(), ["income".to_string()]);
        assert!(matches!(scaler, Scaler::MinMax { .. }));
    }
}
