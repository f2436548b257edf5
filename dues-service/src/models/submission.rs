//! Submission audit record: append-only child of a due.
//!
//! Never updated or deleted. A submission row survives deletion of its
//! parent due; orphaned audit rows are accepted by design.

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::due::{PaymentMethod, VerificationRules};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub due_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub method: PaymentMethod,
    pub submitted_by: String,
    pub submitted_at: DateTime,
    pub paid_amount: f64,
    pub upi_ref: Option<String>,
    /// Heuristic snapshot at submission time, frozen for audit.
    pub rules: VerificationRules,
    /// Submitting platform, e.g. "web", "android".
    pub source: String,
}

impl SubmissionRecord {
    pub const KIND_PAYMENT: &'static str = "payment_submission";
}
