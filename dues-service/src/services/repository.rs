//! Document-store adapter for the due-payment collection.
//!
//! Mutations on a due are conditional updates keyed on its `version` token:
//! a racing writer gets `Conflict` instead of silently overwriting, while
//! submission audit rows are appended unconditionally so both sides of a
//! race still leave a trail.

use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, to_bson, Bson, DateTime, Document};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Collection, Database, IndexModel};
use serde::Serialize;
use service_core::error::AppError;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use crate::models::{
    collections,
    due::{payment_status_str, DueState},
    DueRecord, PaymentMethod, SubmissionRecord, VerificationBlock,
};

/// Query scope: one client's records or the whole firm.
#[derive(Debug, Clone)]
pub enum Scope {
    User(String),
    All,
}

impl Scope {
    fn base_filter(&self) -> Document {
        match self {
            Scope::User(email) => doc! { "userId": email },
            Scope::All => doc! {},
        }
    }
}

#[derive(Clone)]
pub struct DueRepository {
    dues: Collection<DueRecord>,
    submissions: Collection<SubmissionRecord>,
    op_timeout: Duration,
}

impl DueRepository {
    pub fn new(db: &Database, op_timeout: Duration) -> Self {
        Self {
            dues: db.collection(collections::PAYMENTS),
            submissions: db.collection(collections::SUBMISSIONS),
            op_timeout,
        }
    }

    /// Initialize indexes backing the per-user and aggregation queries.
    pub async fn init_indexes(&self) -> Result<(), AppError> {
        let user_status_index = IndexModel::builder()
            .keys(doc! { "userId": 1, "paymentStatus": 1, "createdAt": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_payment_status_idx".to_string())
                    .build(),
            )
            .build();

        let paid_at_index = IndexModel::builder()
            .keys(doc! { "paymentStatus": 1, "paidAt": -1 })
            .options(
                IndexOptions::builder()
                    .name("payment_status_paid_at_idx".to_string())
                    .build(),
            )
            .build();

        self.guard(
            "create_due_indexes",
            self.dues
                .create_indexes([user_status_index, paid_at_index], None),
        )
        .await?;

        let submission_index = IndexModel::builder()
            .keys(doc! { "dueId": 1, "submittedAt": -1 })
            .options(
                IndexOptions::builder()
                    .name("due_submissions_idx".to_string())
                    .build(),
            )
            .build();

        self.guard(
            "create_submission_indexes",
            self.submissions.create_indexes([submission_index], None),
        )
        .await?;

        tracing::info!("Due repository indexes initialized");
        Ok(())
    }

    pub async fn create_due(&self, record: &DueRecord) -> Result<(), AppError> {
        self.guard("create_due", self.dues.insert_one(record, None))
            .await?;
        Ok(())
    }

    pub async fn get_due(&self, id: Uuid) -> Result<Option<DueRecord>, AppError> {
        self.guard(
            "get_due",
            self.dues.find_one(doc! { "_id": id.to_string() }, None),
        )
        .await
    }

    /// `get_due` that treats absence as `NotFound`.
    pub async fn require_due(&self, id: Uuid) -> Result<DueRecord, AppError> {
        self.get_due(id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Due {} not found", id)))
    }

    /// Open dues for a user, newest first.
    ///
    /// Ordering between records with equal `createdAt` is unspecified
    /// (store-assigned).
    pub async fn list_dues_for_user(&self, user_id: &str) -> Result<Vec<DueRecord>, AppError> {
        let filter = doc! { "userId": user_id, "paymentStatus": "due" };
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .build();
        self.find_dues(filter, options).await
    }

    /// Settled dues for a user, most recently paid first.
    pub async fn list_paid_for_user(&self, user_id: &str) -> Result<Vec<DueRecord>, AppError> {
        let filter = doc! { "userId": user_id, "paymentStatus": "paid" };
        let options = FindOptions::builder().sort(doc! { "paidAt": -1 }).build();
        self.find_dues(filter, options).await
    }

    /// Record a payment submission: append the audit row, then move the due
    /// to Under Verification. The coarse `paymentStatus` stays `due` no
    /// matter what the heuristic said; only an admin settles a due.
    pub async fn submit_payment(
        &self,
        due_id: Uuid,
        submission: SubmissionRecord,
        verification: VerificationBlock,
        expected_version: Option<i64>,
    ) -> Result<DueRecord, AppError> {
        // Audit row first. It persists even when the due update below loses
        // a race or the due has since been deleted.
        self.guard(
            "append_submission",
            self.submissions.insert_one(&submission, None),
        )
        .await?;

        let mut filter = doc! {
            "_id": due_id.to_string(),
            // A settled due cannot re-enter verification.
            "state": { "$ne": ser(&DueState::Paid)? },
        };
        if let Some(version) = expected_version {
            filter.insert("version", version);
        }

        let update = doc! {
            "$set": {
                "state": ser(&DueState::UnderVerification)?,
                "status": "Under Verification",
                "paymentMethod": ser(&verification.method)?,
                "paidAmount": submission.paid_amount,
                "verification": ser(&verification)?,
                "updatedAt": DateTime::now(),
            },
            "$inc": { "version": 1 },
        };

        let result = self
            .guard("submit_payment", self.dues.update_one(filter, update, None))
            .await?;

        if result.matched_count == 0 {
            return Err(self.mutation_miss(due_id, "submit_payment").await?);
        }

        self.require_due(due_id).await
    }

    /// Admin settlement: flips the due to Paid/`verified`.
    pub async fn mark_paid(
        &self,
        due_id: Uuid,
        paid_amount: f64,
        method: PaymentMethod,
        paid_at: DateTime,
        status: &str,
        expected_version: Option<i64>,
    ) -> Result<DueRecord, AppError> {
        let mut filter = doc! { "_id": due_id.to_string() };
        if let Some(version) = expected_version {
            filter.insert("version", version);
        }

        let update = doc! {
            "$set": {
                "state": ser(&DueState::Paid)?,
                "status": status,
                "paymentStatus": payment_status_str(DueState::Paid),
                "paidAmount": paid_amount,
                "paymentMethod": ser(&method)?,
                "paidAt": paid_at,
                "updatedAt": DateTime::now(),
            },
            "$inc": { "version": 1 },
        };

        let result = self
            .guard("mark_paid", self.dues.update_one(filter, update, None))
            .await?;

        if result.matched_count == 0 {
            return Err(self.mutation_miss(due_id, "mark_paid").await?);
        }

        self.require_due(due_id).await
    }

    /// Hard delete. Child submission rows are not cascaded; orphaned audit
    /// rows are kept by design.
    pub async fn delete_due(&self, due_id: Uuid) -> Result<(), AppError> {
        let result = self
            .guard(
                "delete_due",
                self.dues.delete_one(doc! { "_id": due_id.to_string() }, None),
            )
            .await?;

        if result.deleted_count == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Due {} not found",
                due_id
            )));
        }
        Ok(())
    }

    /// Audit trail for a due, newest submission first.
    pub async fn list_submissions(&self, due_id: Uuid) -> Result<Vec<SubmissionRecord>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "submittedAt": -1 })
            .build();
        let cursor = self
            .guard(
                "list_submissions",
                self.submissions
                    .find(doc! { "dueId": due_id.to_string() }, Some(options)),
            )
            .await?;
        self.guard("collect_submissions", cursor.try_collect()).await
    }

    // ------------------------------------------------------------------
    // Aggregator reads
    // ------------------------------------------------------------------

    pub async fn list_open_dues(&self, scope: &Scope) -> Result<Vec<DueRecord>, AppError> {
        let mut filter = scope.base_filter();
        filter.insert("paymentStatus", "due");
        self.find_dues(filter, FindOptions::default()).await
    }

    /// Paid records with `paidAt` in the half-open window `[start, end)`.
    pub async fn list_paid_between(
        &self,
        scope: &Scope,
        start: DateTime,
        end: DateTime,
    ) -> Result<Vec<DueRecord>, AppError> {
        let mut filter = scope.base_filter();
        filter.insert("paymentStatus", "paid");
        filter.insert("paidAt", doc! { "$gte": start, "$lt": end });
        self.find_dues(filter, FindOptions::default()).await
    }

    pub async fn list_recent_paid(
        &self,
        scope: &Scope,
        limit: i64,
    ) -> Result<Vec<DueRecord>, AppError> {
        let mut filter = scope.base_filter();
        filter.insert("paymentStatus", "paid");
        let options = FindOptions::builder()
            .sort(doc! { "paidAt": -1 })
            .limit(limit)
            .build();
        self.find_dues(filter, options).await
    }

    /// Full scan used by the admin outstanding-amount fallback.
    pub async fn list_all_dues(&self) -> Result<Vec<DueRecord>, AppError> {
        self.find_dues(doc! {}, FindOptions::default()).await
    }

    // ------------------------------------------------------------------

    async fn find_dues(
        &self,
        filter: Document,
        options: FindOptions,
    ) -> Result<Vec<DueRecord>, AppError> {
        let cursor = self
            .guard("find_dues", self.dues.find(filter, Some(options)))
            .await?;
        self.guard("collect_dues", cursor.try_collect()).await
    }

    /// Disambiguate a conditional update that matched nothing: a missing
    /// document is `NotFound`, an existing one means the version token (or
    /// state guard) no longer holds.
    async fn mutation_miss(&self, due_id: Uuid, op: &'static str) -> Result<AppError, AppError> {
        match self.get_due(due_id).await? {
            None => Ok(AppError::NotFound(anyhow::anyhow!(
                "Due {} not found",
                due_id
            ))),
            Some(current) => Ok(AppError::Conflict(anyhow::anyhow!(
                "{} on due {} rejected: record changed concurrently (version {})",
                op,
                due_id,
                current.version
            ))),
        }
    }

    /// Every store round-trip runs under an explicit deadline; a timeout
    /// surfaces as `BackendUnavailable` rather than hanging the caller.
    async fn guard<T, F>(&self, op: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, mongodb::error::Error>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => {
                tracing::warn!(operation = op, timeout_ms = %self.op_timeout.as_millis(), "store call timed out");
                Err(AppError::BackendUnavailable(anyhow::anyhow!(
                    "store operation {} timed out after {:?}",
                    op,
                    self.op_timeout
                )))
            }
        }
    }
}

fn ser<T: Serialize>(value: &T) -> Result<Bson, AppError> {
    to_bson(value).map_err(|e| AppError::InternalError(anyhow::Error::new(e)))
}

/// Start of the current calendar month, UTC.
pub fn start_of_month(now: chrono::DateTime<Utc>) -> chrono::DateTime<Utc> {
    use chrono::{Datelike, TimeZone};
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// Exclusive-end companion of `start_of_month`: first instant of next month.
pub fn end_of_month(now: chrono::DateTime<Utc>) -> chrono::DateTime<Utc> {
    use chrono::{Datelike, TimeZone};
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn month_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap();
        assert_eq!(
            start_of_month(now),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            end_of_month(now),
            Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn month_bounds_roll_over_december() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(
            start_of_month(now),
            Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            end_of_month(now),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
    }
}
