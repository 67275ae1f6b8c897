use serde_json::Value;

use super::{segment, ApiClient};
use crate::errors::ApiError;
use crate::models::notification::unread_count;
use crate::models::NotificationItem;
use crate::normalize::normalize_list;

impl ApiClient {
    /// GET /api/notifications
    pub async fn notifications(&self) -> Result<Vec<NotificationItem>, ApiError> {
        let raw: Value = self.get("/api/notifications", &[]).await?;
        Ok(normalize_list(&raw))
    }

    /// GET /api/notifications/unread-count
    pub async fn unread_notifications(&self) -> Result<i64, ApiError> {
        let raw: Value = self.get("/api/notifications/unread-count", &[]).await?;
        Ok(unread_count(&raw))
    }

    /// PUT /api/notifications/{id}/read
    pub async fn mark_notification_read(&self, id: &str) -> Result<(), ApiError> {
        let _: Value = self
            .put(&format!("/api/notifications/{}/read", segment(id)))
            .await?;
        Ok(())
    }

    /// PUT /api/notifications/read-all
    pub async fn mark_all_notifications_read(&self) -> Result<(), ApiError> {
        let _: Value = self.put("/api/notifications/read-all").await?;
        Ok(())
    }

    /// DELETE /api/notifications/{id}
    pub async fn remove_notification(&self, id: &str) -> Result<(), ApiError> {
        let _: Value = self
            .delete(&format!("/api/notifications/{}", segment(id)))
            .await?;
        Ok(())
    }
}
