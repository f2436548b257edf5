//! Due lifecycle handlers: admin creates, settles and deletes; clients list.

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
use validator::Validate;

use super::required_field;
use crate::{
    dtos::{AmountInput, CreateDueRequest, DueResponse, MarkPaidRequest},
    middleware::ActorContext,
    models::{DueRecord, PaymentMethod},
    startup::AppState,
};

/// Admin action: register a new obligation for a client.
pub async fn create_due(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<CreateDueRequest>,
) -> Result<(StatusCode, Json<DueResponse>), AppError> {
    actor.require_admin()?;
    payload.validate()?;

    let amount = payload
        .amount
        .as_ref()
        .map(AmountInput::normalized)
        .unwrap_or(0.0);
    if amount <= 0.0 {
        return Err(required_field("amount"));
    }
    let due_date = payload.due_date.ok_or_else(|| required_field("dueDate"))?;

    let record = DueRecord::new(
        payload.user_id,
        payload.label,
        amount,
        DateTime::from_chrono(due_date),
    );

    tracing::info!(
        due_id = %record.id,
        user = %record.user_id,
        amount,
        "creating due"
    );

    state.repository.create_due(&record).await?;
    state.activity.log(
        "due.created",
        json!({ "dueId": record.id.to_string(), "userId": record.user_id.clone(), "amount": amount }),
        Some(&actor.email),
    );

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Open dues for the calling client, newest first.
pub async fn list_dues(
    State(state): State<AppState>,
    actor: ActorContext,
) -> Result<Json<Vec<DueResponse>>, AppError> {
    let dues = state.repository.list_dues_for_user(&actor.email).await?;
    Ok(Json(dues.into_iter().map(DueResponse::from).collect()))
}

/// Settled dues for the calling client, most recently paid first.
pub async fn list_paid(
    State(state): State<AppState>,
    actor: ActorContext,
) -> Result<Json<Vec<DueResponse>>, AppError> {
    let dues = state.repository.list_paid_for_user(&actor.email).await?;
    Ok(Json(dues.into_iter().map(DueResponse::from).collect()))
}

/// Admin confirmation that a payment is genuine. The only path that moves a
/// due to Paid.
pub async fn mark_paid(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(due_id): Path<Uuid>,
    Json(payload): Json<MarkPaidRequest>,
) -> Result<Json<DueResponse>, AppError> {
    actor.require_admin()?;

    let due = state.repository.require_due(due_id).await?;
    let paid_amount = payload
        .paid_amount
        .as_ref()
        .map(AmountInput::normalized)
        .unwrap_or(due.amount);
    let method = payload
        .payment_method
        .or(due.payment_method)
        .unwrap_or(PaymentMethod::Cash);
    let paid_at = DateTime::from_chrono(payload.paid_at.unwrap_or_else(Utc::now));
    let status = payload.status.as_deref().unwrap_or("verified");

    tracing::info!(due_id = %due_id, paid_amount, method = %method, "marking due paid");

    let updated = state
        .repository
        .mark_paid(
            due_id,
            paid_amount,
            method,
            paid_at,
            status,
            payload.expected_version,
        )
        .await?;

    counter!("dues_marked_paid_total").increment(1);
    state.activity.log(
        "due.marked_paid",
        json!({ "dueId": due_id.to_string(), "paidAmount": paid_amount, "method": method.as_str() }),
        Some(&actor.email),
    );

    Ok(Json(updated.into()))
}

/// Admin hard delete. Submission audit rows are left in place.
pub async fn delete_due(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(due_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    actor.require_admin()?;

    state.repository.delete_due(due_id).await?;
    state.activity.log(
        "due.deleted",
        json!({ "dueId": due_id.to_string() }),
        Some(&actor.email),
    );

    Ok(StatusCode::NO_CONTENT)
}
