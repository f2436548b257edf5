//! Support ticket creation and admin close flow.

use mongodb::bson::{doc, DateTime};
use mongodb::{Collection, Database};
use rand::Rng;
use service_core::error::AppError;
use std::time::Duration;

use crate::models::{
    collections,
    ticket::{TICKET_ID_ALPHABET, TICKET_ID_LEN, TICKET_STATUS_ACTIVE, TICKET_STATUS_CLOSED},
    TicketRecord,
};

/// Human-presentable ticket id: 8 symbols from the ambiguity-free alphabet.
pub fn generate_ticket_id<R: Rng>(rng: &mut R) -> String {
    (0..TICKET_ID_LEN)
        .map(|_| TICKET_ID_ALPHABET[rng.gen_range(0..TICKET_ID_ALPHABET.len())] as char)
        .collect()
}

pub struct NewTicket {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub ticket_type: String,
    pub transaction_id: Option<String>,
    pub transaction_amount: Option<f64>,
    pub transaction_time: Option<DateTime>,
}

#[derive(Clone)]
pub struct TicketService {
    tickets: Collection<TicketRecord>,
    op_timeout: Duration,
}

impl TicketService {
    pub fn new(db: &Database, op_timeout: Duration) -> Self {
        Self {
            tickets: db.collection(collections::TICKETS),
            op_timeout,
        }
    }

    /// Single immutable insert, keyed `{email}@{rfc3339-timestamp}`.
    pub async fn create_ticket(&self, new: NewTicket) -> Result<TicketRecord, AppError> {
        let now = DateTime::now();
        let record = TicketRecord {
            id: format!("{}@{}", new.user_id, now.to_chrono().to_rfc3339()),
            ticket_id: generate_ticket_id(&mut rand::thread_rng()),
            user_id: new.user_id,
            title: new.title,
            description: new.description,
            ticket_type: new.ticket_type,
            status: TICKET_STATUS_ACTIVE.to_string(),
            transaction_id: new.transaction_id,
            transaction_amount: new.transaction_amount,
            transaction_time: new.transaction_time,
            timestamp: now,
        };

        self.guarded(self.tickets.insert_one(&record, None)).await?;
        tracing::info!(ticket_id = %record.ticket_id, user = %record.user_id, "ticket created");
        Ok(record)
    }

    pub async fn list_tickets_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<TicketRecord>, AppError> {
        use futures::TryStreamExt;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder()
            .sort(doc! { "timestamp": -1 })
            .build();
        let cursor = self
            .guarded(
                self.tickets
                    .find(doc! { "userId": user_id }, Some(options)),
            )
            .await?;
        self.guarded(cursor.try_collect()).await
    }

    /// Admin mutation: the only write a ticket sees after creation.
    pub async fn close_ticket(&self, ticket_id: &str) -> Result<(), AppError> {
        let result = self
            .guarded(self.tickets.update_one(
                doc! { "ticketId": ticket_id },
                doc! { "$set": { "status": TICKET_STATUS_CLOSED } },
                None,
            ))
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Ticket {} not found",
                ticket_id
            )));
        }
        Ok(())
    }

    async fn guarded<T, F>(&self, fut: F) -> Result<T, AppError>
    where
        F: std::future::Future<Output = Result<T, mongodb::error::Error>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => Err(AppError::BackendUnavailable(anyhow::anyhow!(
                "ticket store operation timed out after {:?}",
                self.op_timeout
            ))),
        }
    }
}
