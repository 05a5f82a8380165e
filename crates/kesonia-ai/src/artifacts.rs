//! Model directory loading.
//!
//! A models directory holds one JSON document per fitted artifact. Everything
//! is read and cross-checked once at startup; any disagreement between the
//! models, scalers and cluster metadata is fatal before the first request.

use std::io::ErrorKind;
use std::path::Path;

use kesonia_core::schema::{LOG_COLUMNS, SCALE_COLUMNS};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::models::{load_classifier, load_regressor};
use crate::{ClusterProfile, FeatureBuilder, KMeans, KesonicPricer, ModelContext, PipelineError, Scaler};

pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const REGRESSOR_FILE: &str = "regressor.json";
pub const CLASSIFICATION_SCALER_FILE: &str = "classification_scaler.json";
pub const REGRESSION_SCALER_FILE: &str = "regression_scaler.json";
pub const KESONIC_SCALER_FILE: &str = "kesonic_scaler.json";
pub const KMEANS_FILE: &str = "kmeans.json";
pub const CLUSTER_INFO_FILE: &str = "cluster_info.json";

pub(crate) fn read_artifact(path: &Path) -> Result<String, PipelineError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PipelineError::ArtifactNotFound(path.to_path_buf()),
        _ => PipelineError::Io(e),
    })
}

/// The classification and regression pipelines scale exactly the fixed
/// scale columns, and every one of them must be a model input.
fn require_scale_columns(pipeline: &str, builder: &FeatureBuilder) -> Result<(), PipelineError> {
    if let Some(column) = SCALE_COLUMNS
        .iter()
        .find(|c| !builder.schema().contains(c))
    {
        return Err(PipelineError::SchemaMismatch(format!(
            "{pipeline} schema is missing scaled column '{column}'"
        )));
    }
    if builder.scaler().columns() != SCALE_COLUMNS {
        return Err(PipelineError::SchemaMismatch(format!(
            "{pipeline} scaler was fitted on {:?}, expected {:?}",
            builder.scaler().columns(),
            SCALE_COLUMNS
        )));
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PipelineError> {
    let text = read_artifact(path)?;
    serde_json::from_str(&text).map_err(|e| PipelineError::InvalidArtifact {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load and validate every artifact under `dir`.
pub fn load_context(dir: &Path) -> Result<ModelContext, PipelineError> {
    let profile: ClusterProfile = read_json(&dir.join(CLUSTER_INFO_FILE))?;
    let log_columns: Vec<String> = LOG_COLUMNS.iter().map(|c| c.to_string()).collect();

    let classifier = load_classifier(&dir.join(CLASSIFIER_FILE))?;
    let classification = FeatureBuilder::new(
        classifier.feature_names().clone(),
        read_json::<Scaler>(&dir.join(CLASSIFICATION_SCALER_FILE))?,
        log_columns.clone(),
    )?
    .with_levels(profile.categories.clone())?;
    require_scale_columns("classification", &classification)?;

    let regressor = load_regressor(&dir.join(REGRESSOR_FILE))?;
    let regression = FeatureBuilder::new(
        regressor.feature_names().clone(),
        read_json::<Scaler>(&dir.join(REGRESSION_SCALER_FILE))?,
        log_columns,
    )?
    .with_levels(profile.categories.clone())?;
    require_scale_columns("regression", &regression)?;

    let kmeans: KMeans = read_json(&dir.join(KMEANS_FILE))?;
    let kesonic_scaler: Scaler = read_json(&dir.join(KESONIC_SCALER_FILE))?;
    let n_clusters = kmeans.n_clusters();
    let pricer = KesonicPricer::new(kmeans, kesonic_scaler, profile)?;

    info!(
        dir = %dir.display(),
        classification_features = classification.schema().len(),
        regression_features = regression.schema().len(),
        clusters = n_clusters,
        "model context loaded"
    );

    ModelContext::new(
        classifier,
        classification,
        regressor,
        regression,
        Box::new(pricer),
    )
}
