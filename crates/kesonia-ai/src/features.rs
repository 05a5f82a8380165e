//! Feature builder: raw applicant record → fixed-order numeric row.
//!
//! Every model input goes through the same five steps:
//!
//! 1. Encode: numeric attributes as-is, plus any synthetic columns, plus one
//!    `<field>_<level>` indicator per categorical field. Indicators follow the
//!    drop-first convention: the baseline level has no column in the training
//!    schema, so it ends up all-zero after projection.
//! 2. Backfill schema columns absent from the encoding with `0.0`.
//! 3. Project onto the schema order, dropping anything extra.
//! 4. `log1p` the configured log columns.
//! 5. Scale the scaler's fitted columns; everything else passes through.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array};
use arrow::record_batch::RecordBatch;
use kesonia_core::schema::{CATEGORICAL_FIELDS, indicator_column};
use kesonia_core::{ApplicantRecord, FeatureSchema};
use tracing::{debug, warn};

use crate::{PipelineError, Scaler};

/// A numeric row conforming to a [`FeatureSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector<'s> {
    schema: &'s FeatureSchema,
    values: Vec<f64>,
}

impl<'s> FeatureVector<'s> {
    pub fn schema(&self) -> &'s FeatureSchema {
        self.schema
    }

    pub fn columns(&self) -> &'s [String] {
        self.schema.columns()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.schema.position(column).map(|i| self.values[i])
    }

    /// Single-row Arrow batch with one Float64 column per schema column.
    pub fn to_record_batch(&self) -> Result<RecordBatch, PipelineError> {
        let columns: Vec<ArrayRef> = self
            .values
            .iter()
            .map(|&v| Arc::new(Float64Array::from(vec![v])) as ArrayRef)
            .collect();
        Ok(RecordBatch::try_new(
            Arc::new(self.schema.to_arrow()),
            columns,
        )?)
    }
}

/// A labelled single-row frame plus the columns that went through `log1p`.
#[derive(Debug, Clone)]
pub struct FeatureFrame {
    pub label: &'static str,
    pub batch: RecordBatch,
    pub log_columns: Vec<String>,
}

/// Build a feature vector for `schema`.
///
/// `extra` adds synthetic numeric columns before encoding. Fails with
/// `SchemaMismatch` if a scaler column is absent from the schema.
pub fn build<'s>(
    record: &ApplicantRecord,
    extra: &[(&str, f64)],
    schema: &'s FeatureSchema,
    scaler: &Scaler,
    log_columns: &[String],
) -> Result<FeatureVector<'s>, PipelineError> {
    let encoded = encode(record, extra);

    let mut backfilled = 0usize;
    let mut values: Vec<f64> = schema
        .columns()
        .iter()
        .map(|column| {
            encoded.get(column.as_str()).copied().unwrap_or_else(|| {
                backfilled += 1;
                0.0
            })
        })
        .collect();

    for column in log_columns {
        if let Some(i) = schema.position(column) {
            values[i] = values[i].ln_1p();
        }
    }

    scaler.transform(&mut values, schema)?;

    debug!(
        columns = values.len(),
        backfilled,
        dropped = encoded.len().saturating_sub(values.len() - backfilled),
        "built feature vector"
    );
    Ok(FeatureVector { schema, values })
}

fn encode(record: &ApplicantRecord, extra: &[(&str, f64)]) -> HashMap<String, f64> {
    let mut encoded: HashMap<String, f64> = record
        .numeric_columns()
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();

    for &(name, value) in extra {
        encoded.insert(name.to_string(), value);
    }

    for field in CATEGORICAL_FIELDS {
        if let Some(level) = record.category(field) {
            encoded.insert(indicator_column(field, level), 1.0);
        }
    }

    encoded
}

/// One of the three feature pipelines: a schema with its fitted scaler,
/// log columns and (optionally) the training-time category levels.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    schema: FeatureSchema,
    scaler: Scaler,
    log_columns: Vec<String>,
    levels: BTreeMap<String, Vec<String>>,
}

impl FeatureBuilder {
    /// Check the schema against the scaler and the encoder vocabulary.
    ///
    /// Every scaler column must be in the schema and every schema column must
    /// be something the encoder can produce; otherwise the artifacts were
    /// exported against a different schema and zero-filling would hide it.
    pub fn new(
        schema: FeatureSchema,
        scaler: Scaler,
        log_columns: Vec<String>,
    ) -> Result<Self, PipelineError> {
        if schema.is_empty() {
            return Err(PipelineError::SchemaMismatch("empty feature schema".into()));
        }
        if let Some(column) = schema.duplicate() {
            return Err(PipelineError::SchemaMismatch(format!(
                "column '{column}' appears twice"
            )));
        }
        if let Some(column) = schema
            .columns()
            .iter()
            .find(|c| !FeatureSchema::is_known_column(c))
        {
            return Err(PipelineError::SchemaMismatch(format!(
                "schema column '{column}' cannot be derived from an applicant record"
            )));
        }

        scaler.check()?;
        if let Some(column) = scaler.columns().iter().find(|c| !schema.contains(c)) {
            return Err(PipelineError::SchemaMismatch(format!(
                "scaled column '{column}' not in schema"
            )));
        }

        Ok(Self {
            schema,
            scaler,
            log_columns,
            levels: BTreeMap::new(),
        })
    }

    /// Attach the ordered training-time levels of the categorical fields.
    ///
    /// The first level of each field is the dropped baseline. The schema's
    /// indicator columns for the field must be drawn from the remaining levels.
    pub fn with_levels(mut self, levels: BTreeMap<String, Vec<String>>) -> Result<Self, PipelineError> {
        for (field, field_levels) in &levels {
            let Some((baseline, rest)) = field_levels.split_first() else {
                return Err(PipelineError::SchemaMismatch(format!(
                    "no levels recorded for '{field}'"
                )));
            };
            for level in self.schema.indicator_levels(field) {
                if level == baseline {
                    return Err(PipelineError::SchemaMismatch(format!(
                        "baseline level '{field}_{level}' must not have an indicator column"
                    )));
                }
                if !rest.iter().any(|l| l == level) {
                    return Err(PipelineError::SchemaMismatch(format!(
                        "indicator column '{field}_{level}' is not a recorded level"
                    )));
                }
            }
        }
        self.levels = levels;
        Ok(self)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn log_columns(&self) -> &[String] {
        &self.log_columns
    }

    /// Frame `features` under `label`, keeping the log columns it actually carries.
    pub fn frame(
        &self,
        label: &'static str,
        features: &FeatureVector<'_>,
    ) -> Result<FeatureFrame, PipelineError> {
        Ok(FeatureFrame {
            label,
            batch: features.to_record_batch()?,
            log_columns: self
                .log_columns
                .iter()
                .filter(|c| features.schema().contains(c))
                .cloned()
                .collect(),
        })
    }

    pub fn build(&self, record: &ApplicantRecord) -> Result<FeatureVector<'_>, PipelineError> {
        self.build_with(record, &[])
    }

    /// Build with synthetic columns added before encoding.
    pub fn build_with(
        &self,
        record: &ApplicantRecord,
        extra: &[(&str, f64)],
    ) -> Result<FeatureVector<'_>, PipelineError> {
        for (field, levels) in &self.levels {
            if let Some(level) = record.category(field)
                && !levels.iter().any(|l| l == level)
            {
                warn!(field = %field, level, "unseen category level, encoding as baseline");
            }
        }
        build(record, extra, &self.schema, &self.scaler, &self.log_columns)
    }
}
