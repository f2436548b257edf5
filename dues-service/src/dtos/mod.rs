//! Request/response types for the HTTP surface.
//!
//! Responses carry both the structured `state` and the legacy
//! `status`/`paymentStatus` strings the existing frontends render; the
//! legacy pair is derived here, at the boundary, never read back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    due::payment_status_str, DueRecord, DueState, PaymentMethod, SubmissionRecord,
    VerificationRules,
};
use crate::utils::{coerce_amount, normalize_amount};

/// Amounts arrive either as JSON numbers or as formatted strings
/// (`"₹ 1,234.50"`); both normalize to rupees.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    pub fn normalized(&self) -> f64 {
        match self {
            AmountInput::Number(n) => coerce_amount(*n),
            AmountInput::Text(s) => normalize_amount(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDueRequest {
    #[validate(email)]
    pub user_id: String,
    #[validate(length(min = 1, max = 200))]
    pub label: String,
    /// Required; validated in the handler so absence maps to a field-level
    /// validation error rather than a body-parse failure.
    pub amount: Option<AmountInput>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPaymentRequest {
    pub method: PaymentMethod,
    pub paid_amount: Option<AmountInput>,
    /// UPI transaction reference (UTR). Absent for cash submissions.
    pub reference: Option<String>,
    /// When the payment was made, per the submitter. Defaults to now.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Version token the client last read; enables conflict detection.
    pub expected_version: Option<i64>,
    /// Submitting platform, e.g. "web", "android".
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaidRequest {
    /// Defaults to the due's own amount.
    pub paid_amount: Option<AmountInput>,
    /// Defaults to the method recorded by the latest submission.
    pub payment_method: Option<PaymentMethod>,
    pub paid_at: Option<DateTime<Utc>>,
    /// Legacy display status to stamp; defaults to "verified".
    pub status: Option<String>,
    pub expected_version: Option<i64>,
}

/// Live-feedback evaluation: pure heuristic, nothing persisted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateSubmissionRequest {
    pub due_amount: AmountInput,
    pub paid_amount: AmountInput,
    pub reference: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    #[validate(length(min = 1, max = 64))]
    pub ticket_type: String,
    pub transaction_id: Option<String>,
    pub transaction_amount: Option<AmountInput>,
    pub transaction_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementRequest {
    #[validate(length(min = 1, max = 200))]
    pub text: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationView {
    pub state: String,
    pub method: PaymentMethod,
    pub review_required: bool,
    pub submitted_by: String,
    pub submitted_at: DateTime<Utc>,
    pub upi_ref: Option<String>,
    pub rules: VerificationRules,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueResponse {
    pub id: Uuid,
    pub user_id: String,
    pub label: String,
    pub amount: f64,
    pub paid_amount: Option<f64>,
    pub payment_method: Option<PaymentMethod>,
    pub state: DueState,
    pub status: String,
    pub payment_status: String,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub verification: Option<VerificationView>,
    pub version: i64,
}

impl From<DueRecord> for DueResponse {
    fn from(record: DueRecord) -> Self {
        let status = record.status_label(Utc::now());
        Self {
            id: record.id,
            user_id: record.user_id,
            label: record.label,
            amount: record.amount,
            paid_amount: record.paid_amount,
            payment_method: record.payment_method,
            state: record.state,
            status,
            payment_status: payment_status_str(record.state).to_string(),
            due_date: record.due_date.to_chrono(),
            created_at: record.created_at.to_chrono(),
            updated_at: record.updated_at.to_chrono(),
            paid_at: record.paid_at.map(|t| t.to_chrono()),
            verification: record.verification.map(|v| VerificationView {
                state: v.state,
                method: v.method,
                review_required: v.review_required,
                submitted_by: v.submitted_by,
                submitted_at: v.submitted_at.to_chrono(),
                upi_ref: v.upi_ref,
                rules: v.rules,
            }),
            version: record.version,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPaymentResponse {
    pub due: DueResponse,
    /// Advisory heuristic result, surfaced as live feedback.
    pub rules: VerificationRules,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub due_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub method: PaymentMethod,
    pub submitted_by: String,
    pub submitted_at: DateTime<Utc>,
    pub paid_amount: f64,
    pub upi_ref: Option<String>,
    pub rules: VerificationRules,
    pub source: String,
}

impl From<SubmissionRecord> for SubmissionResponse {
    fn from(record: SubmissionRecord) -> Self {
        Self {
            id: record.id,
            due_id: record.due_id,
            kind: record.kind,
            method: record.method,
            submitted_by: record.submitted_by,
            submitted_at: record.submitted_at.to_chrono(),
            paid_amount: record.paid_amount,
            upi_ref: record.upi_ref,
            rules: record.rules,
            source: record.source,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: String,
    pub ticket_id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub ticket_type: String,
    pub status: String,
    pub transaction_id: Option<String>,
    pub transaction_amount: Option<f64>,
    pub transaction_time: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

impl From<crate::models::TicketRecord> for TicketResponse {
    fn from(record: crate::models::TicketRecord) -> Self {
        Self {
            id: record.id,
            ticket_id: record.ticket_id,
            user_id: record.user_id,
            title: record.title,
            description: record.description,
            ticket_type: record.ticket_type,
            status: record.status,
            transaction_id: record.transaction_id,
            transaction_amount: record.transaction_amount,
            transaction_time: record.transaction_time.map(|t| t.to_chrono()),
            timestamp: record.timestamp.to_chrono(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementResponse {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::models::AnnouncementRecord> for AnnouncementResponse {
    fn from(record: crate::models::AnnouncementRecord) -> Self {
        Self {
            id: record.id,
            text: record.text,
            created_at: record.created_at.to_chrono(),
            updated_at: record.updated_at.to_chrono(),
        }
    }
}
