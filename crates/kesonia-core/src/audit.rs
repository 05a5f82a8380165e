//! Audit rows forwarded to the external sink, and the finalize step that
//! turns a client-confirmed quote into one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::applicant::{ApplicantRecord, ApplicantSummary};
use crate::lenient;

/// Finalize statuses accepted from the client.
pub const FINALIZED_STATUSES: [&str; 2] = ["Approved", "Loan Processed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    Approved,
    Rejected,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

/// One flat audit row: eleven applicant attributes, the status and three
/// financial figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    #[serde(flatten)]
    pub applicant: ApplicantSummary,
    pub status: AuditStatus,
    pub available_loan_limit: f64,
    pub interest_rate: f64,
    pub requested_loan: f64,
}

impl AuditRecord {
    /// Row for a rejected application: every financial figure is zero.
    pub fn rejected(record: &ApplicantRecord) -> Self {
        Self {
            applicant: ApplicantSummary::from(record),
            status: AuditStatus::Rejected,
            available_loan_limit: 0.0,
            interest_rate: 0.0,
            requested_loan: 0.0,
        }
    }
}

/// Second-round request confirming the amount the applicant wants.
///
/// Carries the quote from the predict response and the applicant fields the
/// client echoes back. Echoed values decode leniently, so only a missing
/// `requested_loan` or a bad `status` can reject the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalizeRequest {
    #[serde(flatten)]
    pub applicant: ApplicantSummary,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub requested_loan: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub available_loan_limit: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub interest_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FinalizeError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid status for loan processing")]
    InvalidState(Option<String>),
}

/// Turn a finalize request into the audit row to forward.
///
/// `requested_loan` is checked before `status`.
pub fn finalize(request: &FinalizeRequest) -> Result<AuditRecord, FinalizeError> {
    let requested_loan = request
        .requested_loan
        .ok_or(FinalizeError::MissingField("requested_loan"))?;

    match request.status.as_deref() {
        Some(status) if FINALIZED_STATUSES.contains(&status) => {}
        other => return Err(FinalizeError::InvalidState(other.map(str::to_string))),
    }

    // TODO: sign the quote at predict time (or re-derive it here) instead of
    // trusting the limit and rate echoed back by the client.
    Ok(AuditRecord {
        applicant: request.applicant.clone(),
        status: AuditStatus::Approved,
        available_loan_limit: request.available_loan_limit.unwrap_or_default(),
        interest_rate: request.interest_rate.unwrap_or_default(),
        requested_loan,
    })
}
