//! Admin broadcast announcements.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{AnnouncementRequest, AnnouncementResponse},
    middleware::ActorContext,
    startup::AppState,
};

pub async fn create_announcement(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<AnnouncementRequest>,
) -> Result<(StatusCode, Json<AnnouncementResponse>), AppError> {
    actor.require_admin()?;
    payload.validate()?;

    let record = state.announcements.create(payload.text).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn list_announcements(
    State(state): State<AppState>,
    _actor: ActorContext,
) -> Result<Json<Vec<AnnouncementResponse>>, AppError> {
    let records = state.announcements.list().await?;
    Ok(Json(
        records.into_iter().map(AnnouncementResponse::from).collect(),
    ))
}

pub async fn update_announcement(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnnouncementRequest>,
) -> Result<Json<AnnouncementResponse>, AppError> {
    actor.require_admin()?;
    payload.validate()?;

    let record = state.announcements.update(id, payload.text).await?;
    Ok(Json(record.into()))
}

pub async fn delete_announcement(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    actor.require_admin()?;
    state.announcements.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
