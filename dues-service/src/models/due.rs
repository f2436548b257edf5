//! Due record model: one document per invoice-like obligation.
//!
//! Lifecycle state lives in a single tagged `state` field. The legacy
//! `status` / `paymentStatus` string pair kept by earlier deployments is
//! derived from `state` at the storage and response boundaries; nothing
//! treats those strings as authoritative.

use chrono::{DateTime as ChronoDateTime, Utc};
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authoritative lifecycle state of a due.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DueState {
    #[default]
    Due,
    UnderVerification,
    Paid,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    #[serde(rename = "UPI")]
    Upi,
    #[serde(rename = "CASH")]
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upi => "UPI",
            Self::Cash => "CASH",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Advisory plausibility checks computed at submission time.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct VerificationRules {
    #[serde(rename = "amountOK")]
    pub amount_ok: bool,
    #[serde(rename = "refOK")]
    pub ref_ok: bool,
    #[serde(rename = "recencyOK")]
    pub recency_ok: bool,
    pub score: u8,
    pub auto: bool,
}

/// Verification context stamped onto a due by the latest submission.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VerificationBlock {
    pub state: String,
    pub method: PaymentMethod,
    pub review_required: bool,
    pub submitted_by: String,
    pub submitted_at: DateTime,
    pub upi_ref: Option<String>,
    pub rules: VerificationRules,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DueRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Owning client, keyed by email.
    pub user_id: String,
    pub label: String,
    /// Original obligation amount in major currency units (rupees).
    pub amount: f64,
    pub paid_amount: Option<f64>,
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub state: DueState,
    /// Legacy display status, derived from `state` on every write.
    pub status: String,
    /// Legacy coarse status (`due` | `paid`), derived from `state` on every
    /// write. Kept as the query/index key shared with existing data.
    pub payment_status: String,
    pub due_date: DateTime,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub paid_at: Option<DateTime>,
    pub verification: Option<VerificationBlock>,
    /// Optimistic-concurrency token, incremented on every mutation.
    #[serde(default)]
    pub version: i64,
}

impl DueRecord {
    pub fn new(user_id: String, label: String, amount: f64, due_date: DateTime) -> Self {
        let now = DateTime::now();
        let mut record = Self {
            id: Uuid::new_v4(),
            user_id,
            label,
            amount,
            paid_amount: None,
            payment_method: None,
            state: DueState::Due,
            status: String::new(),
            payment_status: String::new(),
            due_date,
            created_at: now,
            updated_at: now,
            paid_at: None,
            verification: None,
            version: 0,
        };
        record.status = record.status_label(Utc::now());
        record.payment_status = payment_status_str(record.state).to_string();
        record
    }

    /// Legacy `status` view at a given instant. Open dues flip between
    /// `Pending` and `Overdue` purely as a function of the clock.
    pub fn status_label(&self, now: ChronoDateTime<Utc>) -> String {
        match self.state {
            DueState::Due => {
                if self.due_date.to_chrono() < now {
                    "Overdue".to_string()
                } else {
                    "Pending".to_string()
                }
            }
            DueState::UnderVerification => "Under Verification".to_string(),
            DueState::Paid => {
                if self.status.is_empty() {
                    "verified".to_string()
                } else {
                    self.status.clone()
                }
            }
        }
    }
}

/// Legacy `paymentStatus` view.
pub fn payment_status_str(state: DueState) -> &'static str {
    match state {
        DueState::Paid => "paid",
        _ => "due",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn bson_dt(dt: ChronoDateTime<Utc>) -> DateTime {
        DateTime::from_chrono(dt)
    }

    #[test]
    fn new_due_starts_open() {
        let due = DueRecord::new(
            "client@example.com".into(),
            "GST filing".into(),
            1500.0,
            bson_dt(Utc::now() + Duration::days(7)),
        );
        assert_eq!(due.state, DueState::Due);
        assert_eq!(due.payment_status, "due");
        assert_eq!(due.status, "Pending");
        assert_eq!(due.version, 0);
        assert!(due.paid_amount.is_none());
        assert!(due.verification.is_none());
    }

    #[test]
    fn open_due_past_its_date_reads_overdue() {
        let now = Utc::now();
        let due = DueRecord::new(
            "client@example.com".into(),
            "Audit fee".into(),
            9000.0,
            bson_dt(now - Duration::days(1)),
        );
        assert_eq!(due.status_label(now), "Overdue");
        // The coarse status stays "due" either way.
        assert_eq!(payment_status_str(due.state), "due");
    }

    #[test]
    fn status_label_tracks_state() {
        let now = Utc::now();
        let mut due = DueRecord::new(
            "client@example.com".into(),
            "ITR".into(),
            500.0,
            bson_dt(now + Duration::days(2)),
        );
        assert_eq!(due.status_label(now), "Pending");

        due.state = DueState::UnderVerification;
        assert_eq!(due.status_label(now), "Under Verification");

        due.state = DueState::Paid;
        due.status = "verified".to_string();
        assert_eq!(due.status_label(now), "verified");
        assert_eq!(payment_status_str(due.state), "paid");
    }
}
