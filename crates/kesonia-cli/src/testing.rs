//! Test fixtures: an in-memory model context and recording sinks.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use kesonia_ai::{
    ClusterProfile, FeatureBuilder, KMeans, KesonicPricer, LinearModel, ModelContext, Scaler,
};
use kesonia_core::schema::LOG_COLUMNS;
use kesonia_core::{AuditRecord, FeatureSchema};
use kesonia_sync::{AuditSink, SinkError};
use serde_json::{Value, json};
use tokio::sync::mpsc;

/// Context whose classifier always yields `sigmoid(logit)` and whose
/// regressor always predicts `log1p(8102.08)`.
pub fn context(logit: f64) -> ModelContext {
    let schema: FeatureSchema = ["credit_score", "income", "default_history"]
        .into_iter()
        .collect();
    let log_columns: Vec<String> = LOG_COLUMNS.iter().map(|c| c.to_string()).collect();
    let builder = || {
        FeatureBuilder::new(schema.clone(), Scaler::identity(Vec::new()), log_columns.clone())
            .unwrap()
    };

    let kesonic: FeatureSchema = ["credit_score", "loan_amount", "employment_length"]
        .into_iter()
        .collect();
    let profile = ClusterProfile {
        feature_names: kesonic,
        cluster_names: HashMap::from([(0, "Prime".to_string())]),
        premium_mapping: HashMap::from([("Prime".to_string(), 0.5)]),
        max_distance: 1e6,
        kesonia_base: 3.0,
        margin: 1.5,
        categories: BTreeMap::new(),
        log_columns: Vec::new(),
    };
    let pricer = KesonicPricer::new(
        KMeans::new(vec![vec![750.0, 8102.08, 5.0]]),
        Scaler::identity(Vec::new()),
        profile,
    )
    .unwrap();

    ModelContext::new(
        Box::new(LinearModel::new(schema.clone(), vec![0.0; 3], logit).unwrap()),
        builder(),
        Box::new(LinearModel::new(schema.clone(), vec![0.0; 3], 9.0).unwrap()),
        builder(),
        Box::new(pricer),
    )
    .unwrap()
}

pub fn applicant() -> Value {
    json!({
        "name": "Grace",
        "email": "grace@example.com",
        "credit_score": 750,
        "income": 60000,
        "dti_ratio": 0.2,
        "credit_history_length": 5,
        "default_history": 0,
        "home_ownership": "RENT",
        "loan_purpose": "DEBTCONSOLIDATION"
    })
}

/// Sink that hands every row to a channel.
pub struct ChannelSink(pub mpsc::UnboundedSender<AuditRecord>);

#[async_trait]
impl AuditSink for ChannelSink {
    async fn submit(&self, record: &AuditRecord) -> Result<(), SinkError> {
        let _ = self.0.send(record.clone());
        Ok(())
    }
}

pub struct FailingSink;

#[async_trait]
impl AuditSink for FailingSink {
    async fn submit(&self, _record: &AuditRecord) -> Result<(), SinkError> {
        Err(SinkError::Server {
            status: 500,
            body: "quota exceeded".into(),
        })
    }
}
