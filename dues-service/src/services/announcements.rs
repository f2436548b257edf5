//! Admin broadcast announcements: short free text, hard-deleted.

use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime};
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};
use service_core::error::AppError;
use std::time::Duration;
use uuid::Uuid;

use crate::models::{collections, AnnouncementRecord};

#[derive(Clone)]
pub struct AnnouncementService {
    announcements: Collection<AnnouncementRecord>,
    op_timeout: Duration,
}

impl AnnouncementService {
    pub fn new(db: &Database, op_timeout: Duration) -> Self {
        Self {
            announcements: db.collection(collections::ANNOUNCEMENTS),
            op_timeout,
        }
    }

    pub async fn create(&self, text: String) -> Result<AnnouncementRecord, AppError> {
        let record = AnnouncementRecord::new(text);
        self.guarded(self.announcements.insert_one(&record, None))
            .await?;
        Ok(record)
    }

    pub async fn list(&self) -> Result<Vec<AnnouncementRecord>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .build();
        let cursor = self
            .guarded(self.announcements.find(doc! {}, Some(options)))
            .await?;
        self.guarded(cursor.try_collect()).await
    }

    pub async fn update(&self, id: Uuid, text: String) -> Result<AnnouncementRecord, AppError> {
        let result = self
            .guarded(self.announcements.update_one(
                doc! { "_id": id.to_string() },
                doc! { "$set": { "text": &text, "updatedAt": DateTime::now() } },
                None,
            ))
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Announcement {} not found",
                id
            )));
        }

        self.guarded(
            self.announcements
                .find_one(doc! { "_id": id.to_string() }, None),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Announcement {} not found", id)))
    }

    /// Hard delete, no tombstone.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = self
            .guarded(
                self.announcements
                    .delete_one(doc! { "_id": id.to_string() }, None),
            )
            .await?;

        if result.deleted_count == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Announcement {} not found",
                id
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
                "announcement store operation timed out after {:?}",
                self.op_timeout
            ))),
        }
    }
}
