//! Inference layer: feature preprocessing, model scoring, kesonic cluster
//! pricing and the decision pipeline that sequences them.

pub mod artifacts;
pub mod cluster;
mod error;
pub mod features;
pub mod models;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod pipeline;
pub mod scaler;

pub use artifacts::load_context;
pub use cluster::{ClusterProfile, KMeans, KesonicPricer, Pricing, RatePricer};
pub use error::PipelineError;
pub use features::{FeatureBuilder, FeatureFrame, FeatureVector};
pub use models::{Classifier, LinearModel, Regressor};
pub use pipeline::{Evaluation, ModelContext, Stage};
pub use scaler::Scaler;
