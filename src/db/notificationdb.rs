// db/notificationdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::notificationmodel::{NewNotification, Notification};

#[async_trait]
pub trait NotificationExt {
    async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<Notification, sqlx::Error>;

    async fn get_notifications(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error>;

    async fn get_notification(
        &self,
        notification_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<Notification>, sqlx::Error>;

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<Notification>, sqlx::Error>;

    async fn mark_all_notifications_read(&self, recipient_id: Uuid) -> Result<u64, sqlx::Error>;

    async fn get_unread_count(&self, recipient_id: Uuid) -> Result<i64, sqlx::Error>;

    async fn delete_notification(
        &self,
        notification_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<u64, sqlx::Error>;

    async fn clear_notifications(&self, recipient_id: Uuid) -> Result<u64, sqlx::Error>;
}

#[async_trait]
impl NotificationExt for DBClient {
    async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<Notification, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (
                recipient_id, sender_id, notification_type, title, message,
                related_order_id, related_service_id, data
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, recipient_id, sender_id, notification_type, title, message,
                      related_order_id, related_service_id, is_read, is_sent, data, created_at
            "#,
        )
        .bind(notification.recipient_id)
        .bind(notification.sender_id)
        .bind(notification.notification_type)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.related_order_id)
        .bind(notification.related_service_id)
        .bind(&notification.data)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_notifications(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, recipient_id, sender_id, notification_type, title, message,
                   related_order_id, related_service_id, is_read, is_sent, data, created_at
            FROM notifications
            WHERE recipient_id = $1
              AND (NOT $2 OR is_read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(recipient_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_notification(
        &self,
        notification_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<Notification>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, recipient_id, sender_id, notification_type, title, message,
                   related_order_id, related_service_id, is_read, is_sent, data, created_at
            FROM notifications
            WHERE id = $1 AND recipient_id = $2
            "#,
        )
        .bind(notification_id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<Notification>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1 AND recipient_id = $2
            RETURNING id, recipient_id, sender_id, notification_type, title, message,
                      related_order_id, related_service_id, is_read, is_sent, data, created_at
            "#,
        )
        .bind(notification_id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn mark_all_notifications_read(&self, recipient_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE recipient_id = $1 AND is_read = FALSE
            "#,
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn get_unread_count(&self, recipient_id: Uuid) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND is_read = FALSE",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn delete_notification(
        &self,
        notification_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND recipient_id = $2")
            .bind(notification_id)
            .bind(recipient_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn clear_notifications(&self, recipient_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE recipient_id = $1")
            .bind(recipient_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
