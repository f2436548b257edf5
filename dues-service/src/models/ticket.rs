//! Support ticket, optionally tied to a transaction.

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// Human-presentable ticket id alphabet. Excludes 0/1/I/O to avoid
/// transcription mistakes.
pub const TICKET_ID_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const TICKET_ID_LEN: usize = 8;

pub const TICKET_STATUS_ACTIVE: &str = "Active";
pub const TICKET_STATUS_CLOSED: &str = "Closed";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    /// Document key: `{email}@{rfc3339-timestamp-with-offset}`.
    #[serde(rename = "_id")]
    pub id: String,
    pub ticket_id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub ticket_type: String,
    pub status: String,
    /// Denormalized reference to the transaction this ticket is about.
    pub transaction_id: Option<String>,
    pub transaction_amount: Option<f64>,
    pub transaction_time: Option<DateTime>,
    pub timestamp: DateTime,
}
