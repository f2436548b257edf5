//! Admin-authored broadcast text.

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ANNOUNCEMENT_MAX_LEN: usize = 200;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl AnnouncementRecord {
    pub fn new(text: String) -> Self {
        let now = DateTime::now();
        Self {
            id: Uuid::new_v4(),
            text,
            created_at: now,
            updated_at: now,
        }
    }
}
