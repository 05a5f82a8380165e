//! Audit sink: the append-only external store every final decision is
//! written to. Rejections are forwarded as soon as they are decided;
//! approvals only once the applicant confirms an amount.

#[cfg(feature = "http")]
pub mod http;

use async_trait::async_trait;
use kesonia_core::AuditRecord;
use thiserror::Error;
use tracing::{info, warn};

#[cfg(feature = "http")]
pub use http::HttpAuditSink;

#[derive(Error, Debug)]
pub enum SinkError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sink returned {status}: {body}")]
    Server { status: u16, body: String },
}

/// Destination for audit rows.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn submit(&self, record: &AuditRecord) -> Result<(), SinkError>;
}

/// Sink used when no audit endpoint is configured: rows are logged and
/// dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

#[async_trait]
impl AuditSink for NoopSink {
    async fn submit(&self, record: &AuditRecord) -> Result<(), SinkError> {
        info!(
            status = record.status.as_str(),
            requested_loan = record.requested_loan,
            "no audit sink configured, dropping row"
        );
        Ok(())
    }
}

/// Best-effort submit for the predict path: failures are logged, never
/// surfaced to the caller.
pub async fn forward(sink: &dyn AuditSink, record: &AuditRecord) -> bool {
    match sink.submit(record).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, status = record.status.as_str(), "audit forward failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kesonia_core::ApplicantRecord;
    use serde_json::json;

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn submit(&self, _record: &AuditRecord) -> Result<(), SinkError> {
            Err(SinkError::Server {
                status: 503,
                body: "unavailable".into(),
            })
        }
    }

    fn rejected() -> AuditRecord {
        let record = ApplicantRecord::from_json(&json!({
            "credit_score": 520,
            "income": 18000,
            "dti_ratio": 0.61,
            "credit_history_length": 1,
            "default_history": 1,
            "home_ownership": "RENT",
            "loan_purpose": "PERSONAL"
        }))
        .unwrap();
        AuditRecord::rejected(&record)
    }

    #[tokio::test]
    async fn noop_sink_accepts_everything() {
        assert!(forward(&NoopSink, &rejected()).await);
    }

    #[tokio::test]
    async fn forward_swallows_failures() {
        assert!(!forward(&FailingSink, &rejected()).await);
    }

    #[test]
    fn server_error_message() {
        let err = SinkError::Server {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "sink returned 500: boom");
    }
}
