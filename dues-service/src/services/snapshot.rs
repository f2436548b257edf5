//! Dashboard snapshot aggregation.
//!
//! Full scan + fold, recomputed per call; no cache and no incremental
//! maintenance. The component queries run sequentially and are not atomic
//! with respect to each other, which is acceptable for a dashboard and
//! should not be relied on for reconciliation. Read failures propagate as
//! errors; a snapshot is never fabricated from partial or zeroed data.

use chrono::{DateTime as ChronoDateTime, Utc};
use mongodb::bson::DateTime;
use serde::Serialize;
use service_core::error::AppError;
use tracing::instrument;

use super::repository::{end_of_month, start_of_month, DueRepository, Scope};
use crate::models::DueRecord;
use crate::utils::{coerce_amount, format_inr, format_timestamp};

/// How many overdue entries the dashboard highlights.
const OLD_DUES_LIMIT: usize = 2;
/// How many settled transactions the dashboard lists.
const RECENT_TRANSACTIONS_LIMIT: i64 = 2;

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub total_due: f64,
    pub dues_count: usize,
    pub old_dues: Vec<OldDue>,
    pub recent_transactions: Vec<RecentTransaction>,
    pub this_month_payments: f64,
    pub month_paid_count: usize,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OldDue {
    pub id: String,
    pub label: String,
    pub amount: f64,
    pub due_date: ChronoDateTime<Utc>,
}

/// Display-ready row: amount and timestamp are pre-formatted strings.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecentTransaction {
    pub id: String,
    pub label: String,
    pub amount: String,
    pub ts: String,
}

/// Firm-wide variant: the user snapshot plus the outstanding-amount total
/// computed with the historical-data compatibility shim.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub dues_amount: f64,
    /// Records the outstanding fallback considers open, including legacy
    /// rows matched only by status text.
    pub open_records_count: usize,
}

#[derive(Clone)]
pub struct SnapshotService {
    repository: DueRepository,
}

impl SnapshotService {
    pub fn new(repository: DueRepository) -> Self {
        Self { repository }
    }

    /// Pure function of store state at call time: two invocations with no
    /// intervening writes produce identical output.
    #[instrument(skip(self), fields(scope = ?scope))]
    pub async fn compute_snapshot(&self, scope: &Scope) -> Result<Snapshot, AppError> {
        let now = Utc::now();

        let open = self.repository.list_open_dues(scope).await?;
        let total_due = fold_total_due(&open);
        let dues_count = open.len();
        let old_dues = select_old_dues(&open, now);

        let paid_this_month = self
            .repository
            .list_paid_between(
                scope,
                DateTime::from_chrono(start_of_month(now)),
                DateTime::from_chrono(end_of_month(now)),
            )
            .await?;
        let (this_month_payments, month_paid_count) = fold_month(&paid_this_month);

        let recent = self
            .repository
            .list_recent_paid(scope, RECENT_TRANSACTIONS_LIMIT)
            .await?;
        let recent_transactions = recent_rows(&recent);

        Ok(Snapshot {
            total_due,
            dues_count,
            old_dues,
            recent_transactions,
            this_month_payments,
            month_paid_count,
        })
    }

    #[instrument(skip(self))]
    pub async fn compute_admin_stats(&self) -> Result<AdminStats, AppError> {
        let snapshot = self.compute_snapshot(&Scope::All).await?;
        let all = self.repository.list_all_dues().await?;
        let (dues_amount, open_records_count) = fold_outstanding(&all);

        Ok(AdminStats {
            snapshot,
            dues_amount,
            open_records_count,
        })
    }
}

fn fold_total_due(open: &[DueRecord]) -> f64 {
    open.iter().map(|d| coerce_amount(d.amount)).sum()
}

/// Two-pass selection: pick the two MOST RECENTLY overdue records, then
/// re-sort that slice ascending so the oldest of the pair displays first.
fn select_old_dues(open: &[DueRecord], now: ChronoDateTime<Utc>) -> Vec<OldDue> {
    let mut overdue: Vec<&DueRecord> = open
        .iter()
        .filter(|d| d.due_date.to_chrono() < now)
        .collect();

    overdue.sort_by(|a, b| b.due_date.cmp(&a.due_date));
    overdue.truncate(OLD_DUES_LIMIT);
    overdue.sort_by(|a, b| a.due_date.cmp(&b.due_date));

    overdue
        .into_iter()
        .map(|d| OldDue {
            id: d.id.to_string(),
            label: d.label.clone(),
            amount: coerce_amount(d.amount),
            due_date: d.due_date.to_chrono(),
        })
        .collect()
}

fn fold_month(paid: &[DueRecord]) -> (f64, usize) {
    let total = paid.iter().map(|d| coerce_amount(d.amount)).sum();
    (total, paid.len())
}

fn recent_rows(paid: &[DueRecord]) -> Vec<RecentTransaction> {
    paid.iter()
        .map(|d| {
            let ts = d.paid_at.unwrap_or(d.updated_at).to_chrono();
            RecentTransaction {
                id: d.id.to_string(),
                label: d.label.clone(),
                amount: format_inr(coerce_amount(d.amount)),
                ts: format_timestamp(ts),
            }
        })
        .collect()
}

/// Outstanding = max(0, amount - paidAmount), summed across records that
/// either carry a positive outstanding or whose legacy status text matches
/// due/partial/pending. The text match is a deliberate compatibility shim:
/// historical records do not consistently populate the structured fields.
fn fold_outstanding(all: &[DueRecord]) -> (f64, usize) {
    let mut total = 0.0;
    let mut count = 0;
    for d in all {
        let paid = coerce_amount(d.paid_amount.unwrap_or(0.0));
        let outstanding = (coerce_amount(d.amount) - paid).max(0.0);
        let text = format!("{} {}", d.status, d.payment_status).to_lowercase();
        let fuzzy_open = ["due", "partial", "pending"]
            .iter()
            .any(|needle| text.contains(needle));

        if outstanding > 0.0 || fuzzy_open {
            total += outstanding;
            count += 1;
        }
    }
    (total, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{due::payment_status_str, DueState};
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn due_record(label: &str, amount: f64, due_date: ChronoDateTime<Utc>) -> DueRecord {
        let now = DateTime::now();
        DueRecord {
            id: Uuid::new_v4(),
            user_id: "client@example.com".into(),
            label: label.into(),
            amount,
            paid_amount: None,
            payment_method: None,
            state: DueState::Due,
            status: "Pending".into(),
            payment_status: payment_status_str(DueState::Due).into(),
            due_date: DateTime::from_chrono(due_date),
            created_at: now,
            updated_at: now,
            paid_at: None,
            verification: None,
            version: 0,
        }
    }

    #[test]
    fn total_due_ignores_non_finite_amounts() {
        let now = Utc::now();
        let dues = vec![
            due_record("a", 100.0, now),
            due_record("b", f64::NAN, now),
            due_record("c", 250.5, now),
        ];
        assert_eq!(fold_total_due(&dues), 350.5);
    }

    #[test]
    fn old_dues_selects_most_recent_then_displays_oldest_first() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let d1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let d2 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let d3 = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let dues = vec![
            due_record("jan", 1.0, d1),
            due_record("mar", 1.0, d2),
            due_record("feb", 1.0, d3),
        ];

        let selected = select_old_dues(&dues, now);
        let labels: Vec<&str> = selected.iter().map(|d| d.label.as_str()).collect();
        // The two most recent past dues (feb, mar), displayed oldest first.
        assert_eq!(labels, vec!["feb", "mar"]);
    }

    #[test]
    fn old_dues_skips_future_dates() {
        let now = Utc::now();
        let dues = vec![
            due_record("future", 1.0, now + Duration::days(5)),
            due_record("past", 1.0, now - Duration::days(5)),
        ];
        let selected = select_old_dues(&dues, now);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].label, "past");
    }

    #[test]
    fn recent_rows_format_amount_and_timestamp() {
        let mut paid = due_record("Audit fee", 1234.5, Utc::now());
        paid.state = DueState::Paid;
        paid.paid_at = Some(
            DateTime::from_chrono(Utc.with_ymd_and_hms(2024, 3, 2, 16, 30, 0).unwrap()),
        );

        let rows = recent_rows(&[paid]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "Audit fee");
        assert_eq!(rows[0].amount, "₹1,234.50");
        assert_eq!(rows[0].ts, "02 Mar 2024, 04:30 PM");
    }

    #[test]
    fn outstanding_sums_positive_balances() {
        let now = Utc::now();
        let mut partly_paid = due_record("a", 1000.0, now);
        partly_paid.paid_amount = Some(400.0);

        let mut settled = due_record("b", 500.0, now);
        settled.state = DueState::Paid;
        settled.paid_amount = Some(500.0);
        settled.status = "verified".into();
        settled.payment_status = "paid".into();

        let (total, count) = fold_outstanding(&[partly_paid, settled]);
        assert_eq!(total, 600.0);
        assert_eq!(count, 1);
    }

    #[test]
    fn outstanding_keeps_fuzzy_matched_legacy_records() {
        let now = Utc::now();
        // Fully paid amount-wise, but the legacy status text still says
        // pending: the shim counts the record (contributing zero) instead
        // of dropping it.
        let mut legacy = due_record("legacy", 300.0, now);
        legacy.paid_amount = Some(300.0);
        legacy.status = "Pending".into();
        legacy.payment_status = "paid".into();

        let (total, count) = fold_outstanding(&[legacy]);
        assert_eq!(total, 0.0);
        assert_eq!(count, 1);
    }
}
