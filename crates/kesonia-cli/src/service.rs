//! Request handling shared by the HTTP surface: scoring against the loaded
//! models and forwarding audit rows.

use std::sync::Arc;

use kesonia_ai::{Evaluation, ModelContext, PipelineError};
use kesonia_core::{Decision, FinalizeRequest, finalize};
use kesonia_sync::{AuditSink, forward};
use serde_json::Value;
use tracing::{error, info};

use crate::error::LoanProcessingError;

#[derive(Clone)]
pub struct LoanService {
    context: Arc<ModelContext>,
    sink: Arc<dyn AuditSink>,
}

impl LoanService {
    pub fn new(context: ModelContext, sink: Arc<dyn AuditSink>) -> Self {
        Self {
            context: Arc::new(context),
            sink,
        }
    }

    /// Score an applicant. A rejection is forwarded to the audit sink in the
    /// background; the decision is returned whatever the sink does.
    pub fn predict(&self, raw: &Value) -> Result<Decision, PipelineError> {
        let Evaluation { decision, audit } = self.context.evaluate(raw)?;
        if let Some(record) = audit {
            let sink = Arc::clone(&self.sink);
            tokio::spawn(async move {
                forward(sink.as_ref(), &record).await;
            });
        }
        Ok(decision)
    }

    /// Record the amount an approved applicant settled on. Returns the
    /// requested amount once the sink has accepted the row.
    pub async fn process_loan(&self, request: &FinalizeRequest) -> Result<f64, LoanProcessingError> {
        let record = finalize(request)?;
        if let Err(e) = self.sink.submit(&record).await {
            error!(error = %e, requested_loan = record.requested_loan, "audit store rejected loan");
            return Err(LoanProcessingError::Sink(e));
        }
        info!(
            requested_loan = record.requested_loan,
            available_loan_limit = record.available_loan_limit,
            "loan processed"
        );
        Ok(record.requested_loan)
    }
}
