//! Immutable activity/audit row for support workflows.

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub action: String,
    pub meta: serde_json::Value,
    pub actor: Option<String>,
    pub at: DateTime,
}

impl ActivityRecord {
    pub fn new(action: String, meta: serde_json::Value, actor: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            meta,
            actor,
            at: DateTime::now(),
        }
    }
}
