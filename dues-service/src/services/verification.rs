//! Payment-submission plausibility heuristic.
//!
//! The result is advisory only: it is shown to the submitting user as live
//! feedback and frozen into the audit trail for admin review. It never
//! transitions a due to paid on its own; every submission lands in
//! "Under Verification" and waits for a human.

use chrono::{DateTime, Duration, Utc};

use crate::models::VerificationRules;

/// Accepted deviation between the due amount and the submitted amount.
const AMOUNT_TOLERANCE: f64 = 0.02;

/// Submissions this far from "now" (either direction) still count as recent.
const RECENCY_WINDOW_DAYS: i64 = 3;

const REF_MIN_LEN: usize = 12;
const REF_MAX_LEN: usize = 16;

/// Score a payment submission against the due it claims to settle.
///
/// `now` is injected so boundary behavior is deterministic under test.
pub fn evaluate_submission(
    due_amount: f64,
    paid_amount: f64,
    reference: Option<&str>,
    submitted_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> VerificationRules {
    let amount_ok = amount_within_tolerance(due_amount, paid_amount);
    let ref_ok = reference.map(reference_plausible).unwrap_or(false);
    let recency_ok = within_recency_window(submitted_at, now);

    let score = u8::from(amount_ok) + u8::from(ref_ok) + u8::from(recency_ok);

    VerificationRules {
        amount_ok,
        ref_ok,
        recency_ok,
        score,
        auto: score >= 2,
    }
}

/// Within ±2% of the due amount; non-finite values on either side fail.
fn amount_within_tolerance(due_amount: f64, paid_amount: f64) -> bool {
    if !due_amount.is_finite() || !paid_amount.is_finite() {
        return false;
    }
    let lower = due_amount * (1.0 - AMOUNT_TOLERANCE);
    let upper = due_amount * (1.0 + AMOUNT_TOLERANCE);
    paid_amount >= lower && paid_amount <= upper
}

/// UPI/UTR reference shape: 12-16 uppercase alphanumerics with at least one
/// letter and one digit. Pure-alphabetic or pure-numeric strings are
/// rejected.
fn reference_plausible(reference: &str) -> bool {
    let normalized = reference.trim().to_uppercase();
    if normalized.len() < REF_MIN_LEN || normalized.len() > REF_MAX_LEN {
        return false;
    }
    if !normalized
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return false;
    }
    let has_letter = normalized.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = normalized.chars().any(|c| c.is_ascii_digit());
    has_letter && has_digit
}

/// Two-sided window: early and late submissions are both accepted up to the
/// same bound, inclusive.
fn within_recency_window(submitted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    (now - submitted_at).abs() <= Duration::days(RECENCY_WINDOW_DAYS)
}
