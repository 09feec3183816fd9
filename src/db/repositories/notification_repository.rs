use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::error::StoreResult;
use crate::db::models::{NewNotification, Notification};
use crate::db::store::NotificationStore;

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, notification_type, title, message, is_read, reference_id, created_at, read_at";

pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn insert_notification(&self, notification: NewNotification) -> StoreResult<Notification> {
        let sql = format!(
            "INSERT INTO notifications (id, user_id, notification_type, title, message, reference_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {NOTIFICATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Notification>(&sql)
            .bind(Uuid::now_v7())
            .bind(notification.user_id)
            .bind(notification.notification_type)
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(notification.reference_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_notifications(&self, user_id: Uuid, unread_only: bool) -> StoreResult<Vec<Notification>> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE user_id = $1 AND ($2 = FALSE OR is_read = FALSE) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, Notification>(&sql)
            .bind(user_id)
            .bind(unread_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Notification>> {
        let sql = format!(
            "UPDATE notifications SET is_read = TRUE, read_at = COALESCE(read_at, NOW()) \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {NOTIFICATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Notification>(&sql)
            .bind(notification_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}
