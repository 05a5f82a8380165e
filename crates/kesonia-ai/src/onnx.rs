//! ONNX Runtime scoring for exported classifier / regressor graphs.
//!
//! The graph takes one `[1, n_features]` float tensor. Classifier graphs
//! (e.g. converted gradient-boosting models) emit `label` then
//! `probabilities`; the positive-class probability is the last value of the
//! last output. Regressor graphs emit a single `[1, 1]` prediction.

use std::path::Path;
use std::sync::Mutex;

use kesonia_core::FeatureSchema;
use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use crate::models::{Classifier, Regressor, ensure_conforms};
use crate::{FeatureVector, PipelineError};

pub struct OnnxModel {
    session: Mutex<Session>,
    schema: FeatureSchema,
}

impl OnnxModel {
    pub fn load(path: &Path, schema: FeatureSchema) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::ArtifactNotFound(path.to_path_buf()));
        }
        let session = Session::builder()
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| PipelineError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        info!(model = %path.display(), features = schema.len(), "loaded onnx model");
        Ok(Self {
            session: Mutex::new(session),
            schema,
        })
    }

    /// Run the graph and return the flattened last output.
    fn run(&self, features: &FeatureVector<'_>) -> Result<Vec<f32>, PipelineError> {
        ensure_conforms(&self.schema, features)?;

        let row: Vec<f32> = features.values().iter().map(|&v| v as f32).collect();
        let shape = [1i64, row.len() as i64];
        let input = Tensor::from_array((shape, row.into_boxed_slice()))
            .map_err(|e| PipelineError::Scoring(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| PipelineError::Scoring("onnx session lock poisoned".into()))?;
        let input_name = session.inputs()[0].name().to_string();
        let outputs = session
            .run(ort::inputs![input_name.as_str() => input])
            .map_err(|e| PipelineError::Scoring(e.to_string()))?;

        let last = outputs.len().checked_sub(1).ok_or_else(|| {
            PipelineError::Scoring("onnx model produced no outputs".into())
        })?;
        let (_, data) = outputs[last]
            .try_extract_tensor::<f32>()
            .map_err(|e| PipelineError::Scoring(e.to_string()))?;
        Ok(data.to_vec())
    }
}

impl Classifier for OnnxModel {
    fn feature_names(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict_proba(&self, features: &FeatureVector<'_>) -> Result<f64, PipelineError> {
        let probabilities = self.run(features)?;
        probabilities
            .last()
            .map(|&p| p as f64)
            .ok_or_else(|| PipelineError::Scoring("empty probability output".into()))
    }
}

impl Regressor for OnnxModel {
    fn feature_names(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict(&self, features: &FeatureVector<'_>) -> Result<f64, PipelineError> {
        let prediction = self.run(features)?;
        prediction
            .first()
            .map(|&y| y as f64)
            .ok_or_else(|| PipelineError::Scoring("empty regression output".into()))
    }
}
