//! Payment submission: the client-side half of the due lifecycle.
//!
//! A submission records a claim of payment and moves the due to
//! Under Verification. The heuristic result travels back to the submitter
//! and into the audit trail, but settling the due stays an admin decision.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use metrics::counter;
use mongodb::bson::DateTime;
use serde_json::json;
use service_core::error::AppError;
use uuid::Uuid;

use super::required_field;
use crate::{
    dtos::{
        AmountInput, EvaluateSubmissionRequest, SubmissionResponse, SubmitPaymentRequest,
        SubmitPaymentResponse,
    },
    middleware::{ActorContext, Role},
    models::{PaymentMethod, SubmissionRecord, VerificationBlock, VerificationRules},
    services::verification::evaluate_submission,
    startup::AppState,
};

pub async fn submit_payment(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(due_id): Path<Uuid>,
    Json(payload): Json<SubmitPaymentRequest>,
) -> Result<(StatusCode, Json<SubmitPaymentResponse>), AppError> {
    let due = state.repository.require_due(due_id).await?;
    if due.user_id != actor.email && actor.role != Role::Admin {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "due {} belongs to another client",
            due_id
        )));
    }

    let paid_amount = payload
        .paid_amount
        .as_ref()
        .map(AmountInput::normalized)
        .unwrap_or(0.0);
    if paid_amount <= 0.0 {
        return Err(required_field("paidAmount"));
    }

    let reference = payload
        .reference
        .as_deref()
        .map(|r| r.trim().to_uppercase())
        .filter(|r| !r.is_empty());
    let upi_ref = match payload.method {
        PaymentMethod::Upi => reference.clone(),
        PaymentMethod::Cash => None,
    };

    let now = Utc::now();
    let submitted_at = payload.submitted_at.unwrap_or(now);
    let rules = evaluate_submission(
        due.amount,
        paid_amount,
        reference.as_deref(),
        submitted_at,
        now,
    );

    let submission = SubmissionRecord {
        id: Uuid::new_v4(),
        due_id,
        kind: SubmissionRecord::KIND_PAYMENT.to_string(),
        method: payload.method,
        submitted_by: actor.email.clone(),
        submitted_at: DateTime::from_chrono(submitted_at),
        paid_amount,
        upi_ref: upi_ref.clone(),
        rules,
        source: payload.source.unwrap_or_else(|| "web".to_string()),
    };

    let verification = VerificationBlock {
        state: "submitted".to_string(),
        method: payload.method,
        // Always true: auto-accept is computed but never acted on.
        review_required: true,
        submitted_by: actor.email.clone(),
        submitted_at: DateTime::from_chrono(submitted_at),
        upi_ref,
        rules,
    };

    tracing::info!(
        due_id = %due_id,
        paid_amount,
        method = %payload.method,
        score = rules.score,
        auto = rules.auto,
        "payment submitted"
    );

    let updated = state
        .repository
        .submit_payment(due_id, submission, verification, payload.expected_version)
        .await?;

    let labels = [("auto", rules.auto.to_string())];
    counter!("due_submissions_total", &labels).increment(1);
    state.activity.log(
        "due.payment_submitted",
        json!({ "dueId": due_id.to_string(), "paidAmount": paid_amount, "score": rules.score }),
        Some(&actor.email),
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitPaymentResponse {
            due: updated.into(),
            rules,
        }),
    ))
}

/// Live feedback while the user fills the payment form. Pure evaluation,
/// nothing persisted.
pub async fn preview_submission(
    _actor: ActorContext,
    Json(payload): Json<EvaluateSubmissionRequest>,
) -> Json<VerificationRules> {
    let now = Utc::now();
    let reference = payload
        .reference
        .as_deref()
        .map(|r| r.trim().to_uppercase())
        .filter(|r| !r.is_empty());

    Json(evaluate_submission(
        payload.due_amount.normalized(),
        payload.paid_amount.normalized(),
        reference.as_deref(),
        payload.submitted_at.unwrap_or(now),
        now,
    ))
}

/// Audit trail for a due, admin review surface.
pub async fn list_submissions(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(due_id): Path<Uuid>,
) -> Result<Json<Vec<SubmissionResponse>>, AppError> {
    actor.require_admin()?;
    let submissions = state.repository.list_submissions(due_id).await?;
    Ok(Json(
        submissions
            .into_iter()
            .map(SubmissionResponse::from)
            .collect(),
    ))
}
