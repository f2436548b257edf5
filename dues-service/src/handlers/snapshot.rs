//! Dashboard snapshot endpoints.

use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    middleware::ActorContext,
    services::snapshot::{AdminStats, Snapshot},
    services::Scope,
    startup::AppState,
};

/// Per-client dashboard snapshot, recomputed on every call.
pub async fn get_snapshot(
    State(state): State<AppState>,
    actor: ActorContext,
) -> Result<Json<Snapshot>, AppError> {
    let snapshot = state
        .snapshots
        .compute_snapshot(&Scope::User(actor.email))
        .await?;
    Ok(Json(snapshot))
}

/// Firm-wide stats for the admin dashboard.
pub async fn admin_stats(
    State(state): State<AppState>,
    actor: ActorContext,
) -> Result<Json<AdminStats>, AppError> {
    actor.require_admin()?;
    let stats = state.snapshots.compute_admin_stats().await?;
    Ok(Json(stats))
}
