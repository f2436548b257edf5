//! Support ticket handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mongodb::bson::DateTime;
use serde_json::json;
use service_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{AmountInput, CreateTicketRequest, TicketResponse},
    middleware::ActorContext,
    services::tickets::NewTicket,
    startup::AppState,
};

pub async fn create_ticket(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<TicketResponse>), AppError> {
    payload.validate()?;

    let ticket = state
        .tickets
        .create_ticket(NewTicket {
            user_id: actor.email.clone(),
            title: payload.title,
            description: payload.description,
            ticket_type: payload.ticket_type,
            transaction_id: payload.transaction_id,
            transaction_amount: payload
                .transaction_amount
                .as_ref()
                .map(AmountInput::normalized),
            transaction_time: payload.transaction_time.map(DateTime::from_chrono),
        })
        .await?;

    state.activity.log(
        "ticket.created",
        json!({ "ticketId": ticket.ticket_id.clone(), "type": ticket.ticket_type.clone() }),
        Some(&actor.email),
    );

    Ok((StatusCode::CREATED, Json(ticket.into())))
}

pub async fn list_tickets(
    State(state): State<AppState>,
    actor: ActorContext,
) -> Result<Json<Vec<TicketResponse>>, AppError> {
    let tickets = state.tickets.list_tickets_for_user(&actor.email).await?;
    Ok(Json(tickets.into_iter().map(TicketResponse::from).collect()))
}

/// Admin closes a ticket; the only mutation after creation.
pub async fn close_ticket(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(ticket_id): Path<String>,
) -> Result<StatusCode, AppError> {
    actor.require_admin()?;
    state.tickets.close_ticket(&ticket_id).await?;

    state.activity.log(
        "ticket.closed",
        json!({ "ticketId": ticket_id }),
        Some(&actor.email),
    );

    Ok(StatusCode::NO_CONTENT)
}
