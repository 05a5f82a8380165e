//! Scoring model seams and the linear artifact format.
//!
//! The trained models are opaque to the pipeline: a classifier exposes an
//! approval probability, a regressor a log-scale loan amount, and both expose
//! the feature list they were trained on. The bundled implementation is a
//! linear model exported as JSON (`logistic` for the classifier, `linear` for
//! the regressor); the `onnx` feature adds ONNX Runtime sessions.

use std::path::Path;

use kesonia_core::FeatureSchema;
use serde::Deserialize;
use tracing::info;

use crate::{FeatureVector, PipelineError};

/// Binary approval model.
pub trait Classifier: Send + Sync {
    /// Training-time feature list, in order.
    fn feature_names(&self) -> &FeatureSchema;

    /// Probability of the positive (approve) class.
    fn predict_proba(&self, features: &FeatureVector<'_>) -> Result<f64, PipelineError>;
}

/// Loan amount model; predicts `log1p(amount)`.
pub trait Regressor: Send + Sync {
    fn feature_names(&self) -> &FeatureSchema;

    fn predict(&self, features: &FeatureVector<'_>) -> Result<f64, PipelineError>;
}

/// Fail unless `features` was built for exactly `schema`.
pub fn ensure_conforms(
    schema: &FeatureSchema,
    features: &FeatureVector<'_>,
) -> Result<(), PipelineError> {
    if features.columns() != schema.columns() {
        return Err(PipelineError::Scoring(format!(
            "feature vector has {} columns, model expects {} in training order",
            features.len(),
            schema.len()
        )));
    }
    Ok(())
}

/// `w · x + b` over a fixed feature list.
#[derive(Debug, Clone)]
pub struct LinearModel {
    schema: FeatureSchema,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    pub fn new(
        schema: FeatureSchema,
        coefficients: Vec<f64>,
        intercept: f64,
    ) -> Result<Self, PipelineError> {
        if coefficients.len() != schema.len() {
            return Err(PipelineError::SchemaMismatch(format!(
                "{} coefficients for {} features",
                coefficients.len(),
                schema.len()
            )));
        }
        Ok(Self {
            schema,
            coefficients,
            intercept,
        })
    }

    /// Raw linear response (log-odds for a logistic model).
    pub fn decision_function(&self, features: &FeatureVector<'_>) -> Result<f64, PipelineError> {
        ensure_conforms(&self.schema, features)?;
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features.values())
            .map(|(w, x)| w * x)
            .sum();
        let score = dot + self.intercept;
        if !score.is_finite() {
            return Err(PipelineError::Scoring("non-finite model output".into()));
        }
        Ok(score)
    }
}

impl Classifier for LinearModel {
    fn feature_names(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict_proba(&self, features: &FeatureVector<'_>) -> Result<f64, PipelineError> {
        Ok(sigmoid(self.decision_function(features)?))
    }
}

impl Regressor for LinearModel {
    fn feature_names(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict(&self, features: &FeatureVector<'_>) -> Result<f64, PipelineError> {
        self.decision_function(features)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// On-disk model description.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ModelSpec {
    Logistic {
        feature_names: FeatureSchema,
        coefficients: Vec<f64>,
        intercept: f64,
    },
    Linear {
        feature_names: FeatureSchema,
        coefficients: Vec<f64>,
        intercept: f64,
    },
    #[cfg(feature = "onnx")]
    Onnx {
        path: std::path::PathBuf,
        feature_names: FeatureSchema,
    },
}

impl ModelSpec {
    fn kind(&self) -> &'static str {
        match self {
            Self::Logistic { .. } => "logistic",
            Self::Linear { .. } => "linear",
            #[cfg(feature = "onnx")]
            Self::Onnx { .. } => "onnx",
        }
    }
}

fn read_spec(path: &Path) -> Result<ModelSpec, PipelineError> {
    let text = crate::artifacts::read_artifact(path)?;
    serde_json::from_str(&text).map_err(|e| PipelineError::InvalidArtifact {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load the approval classifier described by `path`.
pub fn load_classifier(path: &Path) -> Result<Box<dyn Classifier>, PipelineError> {
    let model: Box<dyn Classifier> = match read_spec(path)? {
        ModelSpec::Logistic {
            feature_names,
            coefficients,
            intercept,
        } => Box::new(LinearModel::new(feature_names, coefficients, intercept)?),
        #[cfg(feature = "onnx")]
        ModelSpec::Onnx {
            path: model_path,
            feature_names,
        } => Box::new(crate::onnx::OnnxModel::load(
            &resolve(path, &model_path),
            feature_names,
        )?),
        other => {
            return Err(PipelineError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: format!("'{}' model cannot be used as a classifier", other.kind()),
            });
        }
    };
    info!(
        path = %path.display(),
        features = model.feature_names().len(),
        "loaded classifier"
    );
    Ok(model)
}

/// Load the loan-amount regressor described by `path`.
pub fn load_regressor(path: &Path) -> Result<Box<dyn Regressor>, PipelineError> {
    let model: Box<dyn Regressor> = match read_spec(path)? {
        ModelSpec::Linear {
            feature_names,
            coefficients,
            intercept,
        } => Box::new(LinearModel::new(feature_names, coefficients, intercept)?),
        #[cfg(feature = "onnx")]
        ModelSpec::Onnx {
            path: model_path,
            feature_names,
        } => Box::new(crate::onnx::OnnxModel::load(
            &resolve(path, &model_path),
            feature_names,
        )?),
        other => {
            return Err(PipelineError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: format!("'{}' model cannot be used as a regressor", other.kind()),
            });
        }
    };
    info!(
        path = %path.display(),
        features = model.feature_names().len(),
        "loaded regressor"
    );
    Ok(model)
}

/// Resolve a model path relative to the descriptor that names it.
#[cfg(feature = "onnx")]
fn resolve(descriptor: &Path, model_path: &Path) -> std::path::PathBuf {
    match descriptor.parent() {
        Some(dir) if model_path.is_relative() => dir.join(model_path),
        _ => model_path.to_path_buf(),
    }
}
