//! Kesonic pricing: nearest-centroid segmentation and distance-based premium.
//!
//! An approved applicant is placed in the kesonic feature space (the
//! applicant attributes plus the predicted loan amount), assigned to the
//! nearest pre-trained centroid, and priced as
//!
//! ```text
//! rate = kesonia_base + base_premium[cluster] + 10 * distance / max_distance + margin
//! ```
//!
//! The premium adjustment is deliberately unclamped: an applicant farther from
//! the centroid than any training member pays more than 10 points.

use std::collections::{BTreeMap, HashMap};

use kesonia_core::schema::{
    EMPLOYMENT_LENGTH_COLUMN, EMPLOYMENT_LENGTH_PLACEHOLDER, LOAN_AMOUNT_COLUMN,
};
use kesonia_core::{ApplicantRecord, FeatureSchema};
use serde::Deserialize;
use tracing::debug;

use crate::{FeatureBuilder, FeatureFrame, FeatureVector, PipelineError, Scaler};

/// Label used when a cluster index has no recorded name.
pub const DEFAULT_CLUSTER_NAME: &str = "Standard";
/// Base premium for clusters missing from the premium mapping.
pub const DEFAULT_BASE_PREMIUM: f64 = 1.0;
/// Premium points at `distance == max_distance`.
pub const PREMIUM_SPAN: f64 = 10.0;

/// Pre-trained k-means centroids in the scaled kesonic space.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KMeans {
    centers: Vec<Vec<f64>>,
}

impl KMeans {
    pub fn new(centers: Vec<Vec<f64>>) -> Self {
        Self { centers }
    }

    pub fn n_clusters(&self) -> usize {
        self.centers.len()
    }

    pub fn centroid(&self, cluster: usize) -> Option<&[f64]> {
        self.centers.get(cluster).map(Vec::as_slice)
    }

    /// Index and distance of the nearest centroid. Ties go to the lower index.
    pub fn nearest(&self, point: &[f64]) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (cluster, centroid) in self.centers.iter().enumerate() {
            let distance = euclidean_distance(point, centroid);
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((cluster, distance));
            }
        }
        best
    }

    /// Nearest-centroid assignment.
    pub fn predict(&self, point: &[f64]) -> Option<usize> {
        self.nearest(point).map(|(cluster, _)| cluster)
    }
}

pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Distance from the centroid mapped linearly onto premium points.
pub fn premium_adjustment(distance: f64, max_distance: f64) -> f64 {
    (distance / max_distance) * PREMIUM_SPAN
}

/// Offline-trained cluster metadata (`cluster_info.json`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClusterProfile {
    /// Kesonic feature schema; centroids live in this space.
    pub feature_names: FeatureSchema,
    #[serde(default)]
    pub cluster_names: HashMap<usize, String>,
    #[serde(default)]
    pub premium_mapping: HashMap<String, f64>,
    pub max_distance: f64,
    pub kesonia_base: f64,
    pub margin: f64,
    /// Ordered training-time levels per categorical field; first is baseline.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
    /// Columns log1p-transformed before the kesonic scaler.
    #[serde(default)]
    pub log_columns: Vec<String>,
}

impl ClusterProfile {
    pub fn cluster_name(&self, cluster: usize) -> &str {
        self.cluster_names
            .get(&cluster)
            .map(String::as_str)
            .unwrap_or(DEFAULT_CLUSTER_NAME)
    }

    pub fn base_premium(&self, cluster_name: &str) -> f64 {
        self.premium_mapping
            .get(cluster_name)
            .copied()
            .unwrap_or(DEFAULT_BASE_PREMIUM)
    }

    /// `kesonia_base + base_premium + premium_adjustment + margin`.
    pub fn interest_rate(&self, cluster_name: &str, premium_adjustment: f64) -> f64 {
        self.kesonia_base + self.base_premium(cluster_name) + premium_adjustment + self.margin
    }
}

/// Pricing outcome for one approved applicant.
#[derive(Debug, Clone, PartialEq)]
pub struct Pricing {
    pub cluster: usize,
    pub cluster_name: String,
    pub distance: f64,
    pub premium_adjustment: f64,
    pub interest_rate: f64,
}

/// Interest-rate pricing seam used by the decision pipeline.
pub trait RatePricer: Send + Sync {
    fn price(&self, record: &ApplicantRecord, loan_amount: f64) -> Result<Pricing, PipelineError>;

    /// Feature frame the pricer scores, for inspection.
    fn feature_frame(
        &self,
        _record: &ApplicantRecord,
        _loan_amount: f64,
    ) -> Result<Option<FeatureFrame>, PipelineError> {
        Ok(None)
    }
}

/// Cluster-distance pricer over the kesonic feature space.
#[derive(Debug, Clone)]
pub struct KesonicPricer {
    features: FeatureBuilder,
    kmeans: KMeans,
    profile: ClusterProfile,
}

impl KesonicPricer {
    /// Assemble the pricer, checking the artifacts agree with each other.
    pub fn new(kmeans: KMeans, scaler: Scaler, profile: ClusterProfile) -> Result<Self, PipelineError> {
        if kmeans.n_clusters() == 0 {
            return Err(PipelineError::SchemaMismatch("k-means model has no centroids".into()));
        }
        let dim = profile.feature_names.len();
        if let Some((cluster, centroid)) = kmeans
            .centers
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != dim)
        {
            return Err(PipelineError::SchemaMismatch(format!(
                "centroid {cluster} has {} dimensions, kesonic schema has {dim}",
                centroid.len()
            )));
        }
        if !(profile.max_distance.is_finite() && profile.max_distance > 0.0) {
            return Err(PipelineError::SchemaMismatch(format!(
                "max_distance must be positive, got {}",
                profile.max_distance
            )));
        }

        let features = FeatureBuilder::new(
            profile.feature_names.clone(),
            scaler,
            profile.log_columns.clone(),
        )?
        .with_levels(profile.categories.clone())?;

        Ok(Self {
            features,
            kmeans,
            profile,
        })
    }

    pub fn profile(&self) -> &ClusterProfile {
        &self.profile
    }

    pub fn kmeans(&self) -> &KMeans {
        &self.kmeans
    }

    /// Kesonic vector: the record plus the predicted amount and the
    /// employment-length placeholder.
    pub fn build_features(
        &self,
        record: &ApplicantRecord,
        loan_amount: f64,
    ) -> Result<FeatureVector<'_>, PipelineError> {
        self.features.build_with(
            record,
            &[
                (LOAN_AMOUNT_COLUMN, loan_amount),
                (EMPLOYMENT_LENGTH_COLUMN, EMPLOYMENT_LENGTH_PLACEHOLDER),
            ],
        )
    }
}

impl RatePricer for KesonicPricer {
    fn price(&self, record: &ApplicantRecord, loan_amount: f64) -> Result<Pricing, PipelineError> {
        let features = self.build_features(record, loan_amount)?;
        let (cluster, distance) = self
            .kmeans
            .nearest(features.values())
            .ok_or_else(|| PipelineError::Scoring("no centroid to assign to".into()))?;

        let cluster_name = self.profile.cluster_name(cluster).to_string();
        let premium_adjustment = premium_adjustment(distance, self.profile.max_distance);
        let interest_rate = self.profile.interest_rate(&cluster_name, premium_adjustment);

        debug!(
            cluster,
            cluster_name = %cluster_name,
            distance,
            premium_adjustment,
            interest_rate,
            "priced applicant"
        );
        Ok(Pricing {
            cluster,
            cluster_name,
            distance,
            premium_adjustment,
            interest_rate,
        })
    }

    fn feature_frame(
        &self,
        record: &ApplicantRecord,
        loan_amount: f64,
    ) -> Result<Option<FeatureFrame>, PipelineError> {
        let features = self.build_features(record, loan_amount)?;
        Ok(Some(self.features.frame("kesonic", &features)?))
    }
}
