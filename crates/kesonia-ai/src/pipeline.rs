//! Decision orchestrator.
//!
//! One request walks `Validating → Classifying → (Rejected | Predicting) →
//! Pricing → Approved`. The [`ModelContext`] holding the fitted artifacts is
//! built once at startup and only ever read afterwards, so a single instance
//! can be shared across concurrent requests.

use kesonia_core::{APPROVAL_THRESHOLD, ApplicantRecord, AuditRecord, Decision};
use serde_json::Value;
use tracing::{debug, info};

use crate::{Classifier, FeatureBuilder, FeatureFrame, PipelineError, RatePricer, Regressor};

/// Pipeline state for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Classifying,
    Rejected,
    Predicting,
    Pricing,
    Approved,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Classifying => "classifying",
            Self::Rejected => "rejected",
            Self::Predicting => "predicting",
            Self::Pricing => "pricing",
            Self::Approved => "approved",
        }
    }
}

/// Result of evaluating one applicant.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub decision: Decision,
    /// Row to forward to the audit sink now. Only rejections are audited
    /// immediately; an approval is a provisional quote finalized later.
    pub audit: Option<AuditRecord>,
}

/// Immutable set of fitted artifacts the pipeline scores with.
pub struct ModelContext {
    classifier: Box<dyn Classifier>,
    classification: FeatureBuilder,
    regressor: Box<dyn Regressor>,
    regression: FeatureBuilder,
    pricer: Box<dyn RatePricer>,
    approval_threshold: f64,
}

impl ModelContext {
    /// Each feature builder must target its model's training schema.
    pub fn new(
        classifier: Box<dyn Classifier>,
        classification: FeatureBuilder,
        regressor: Box<dyn Regressor>,
        regression: FeatureBuilder,
        pricer: Box<dyn RatePricer>,
    ) -> Result<Self, PipelineError> {
        if classification.schema() != classifier.feature_names() {
            return Err(PipelineError::SchemaMismatch(
                "classification features do not match the classifier's feature list".into(),
            ));
        }
        if regression.schema() != regressor.feature_names() {
            return Err(PipelineError::SchemaMismatch(
                "regression features do not match the regressor's feature list".into(),
            ));
        }
        Ok(Self {
            classifier,
            classification,
            regressor,
            regression,
            pricer,
            approval_threshold: APPROVAL_THRESHOLD,
        })
    }

    pub fn with_approval_threshold(mut self, threshold: f64) -> Self {
        self.approval_threshold = threshold;
        self
    }

    pub fn approval_threshold(&self) -> f64 {
        self.approval_threshold
    }

    /// Validate a raw request body and evaluate it.
    pub fn evaluate(&self, raw: &Value) -> Result<Evaluation, PipelineError> {
        debug!(stage = Stage::Validating.as_str());
        let record = ApplicantRecord::from_json(raw)?;
        self.evaluate_record(&record)
    }

    pub fn evaluate_record(&self, record: &ApplicantRecord) -> Result<Evaluation, PipelineError> {
        debug!(stage = Stage::Classifying.as_str());
        let features = self.classification.build(record)?;
        let probability = self.classifier.predict_proba(&features)?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(PipelineError::Scoring(format!(
                "classifier returned probability {probability}"
            )));
        }

        if probability < self.approval_threshold {
            info!(
                stage = Stage::Rejected.as_str(),
                probability, "application rejected"
            );
            return Ok(Evaluation {
                decision: Decision::rejected(probability),
                audit: Some(AuditRecord::rejected(record)),
            });
        }

        debug!(stage = Stage::Predicting.as_str());
        let features = self.regression.build(record)?;
        let log_amount = self.regressor.predict(&features)?;
        let loan_amount = log_amount.exp_m1();
        if !(loan_amount.is_finite() && loan_amount > 0.0) {
            return Err(PipelineError::Scoring(format!(
                "regressor returned log-amount {log_amount}, loan amount {loan_amount}"
            )));
        }

        debug!(stage = Stage::Pricing.as_str(), loan_amount);
        let pricing = self.pricer.price(record, loan_amount)?;

        info!(
            stage = Stage::Approved.as_str(),
            probability,
            loan_amount,
            interest_rate = pricing.interest_rate,
            cluster = %pricing.cluster_name,
            "application approved, awaiting final amount"
        );
        Ok(Evaluation {
            decision: Decision::approved(
                probability,
                loan_amount,
                pricing.interest_rate,
                pricing.cluster_name,
            ),
            audit: None,
        })
    }

    /// Feature frames each stage would score, labelled by pipeline.
    ///
    /// The kesonic frame needs a predicted amount, so it is only produced
    /// when the regressor runs, whatever the approval outcome.
    pub fn explain(&self, record: &ApplicantRecord) -> Result<Vec<FeatureFrame>, PipelineError> {
        let classification = self.classification.build(record)?;
        let mut frames = vec![self.classification.frame("classification", &classification)?];

        let regression = self.regression.build(record)?;
        let loan_amount = self.regressor.predict(&regression)?.exp_m1();
        frames.push(self.regression.frame("regression", &regression)?);

        if let Some(kesonic) = self.pricer.feature_frame(record, loan_amount)? {
            frames.push(kesonic);
        }
        Ok(frames)
    }
}
