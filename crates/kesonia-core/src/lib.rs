pub mod applicant;
pub mod audit;
pub mod decision;
mod lenient;
pub mod schema;
pub mod validation;

pub use applicant::{ApplicantRecord, ApplicantSummary};
pub use audit::{AuditRecord, AuditStatus, FinalizeError, FinalizeRequest, finalize};
pub use decision::{APPROVAL_THRESHOLD, Decision};
pub use schema::FeatureSchema;
pub use validation::{ValidationError, validate};
