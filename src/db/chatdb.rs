// db/chatdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::chatmodel::*;

#[async_trait]
pub trait ChatExt {
    // Conversation management
    async fn create_conversation(
        &self,
        subject: String,
        related_order_id: Option<Uuid>,
        related_service_id: Option<Uuid>,
        participant_ids: &[Uuid],
    ) -> Result<Conversation, Error>;

    async fn get_user_conversations(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Conversation>, Error>;

    async fn get_conversation(&self, conversation_id: Uuid) -> Result<Option<Conversation>, Error>;

    async fn get_participant_ids(&self, conversation_id: Uuid) -> Result<Vec<Uuid>, Error>;

    // Message management
    async fn send_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: String,
        message_type: MessageType,
        attachment: Option<String>,
    ) -> Result<Message, Error>;

    async fn get_messages(
        &self,
        conversation_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, Error>;

    async fn mark_messages_as_read(
        &self,
        conversation_id: Uuid,
        reader_id: Uuid,
    ) -> Result<u64, Error>;
}

#[async_trait]
impl ChatExt for DBClient {
    async fn create_conversation(
        &self,
        subject: String,
        related_order_id: Option<Uuid>,
        related_service_id: Option<Uuid>,
        participant_ids: &[Uuid],
    ) -> Result<Conversation, Error> {
        let mut tx = self.pool.begin().await?;

        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations (subject, related_order_id, related_service_id)
            VALUES ($1, $2, $3)
            RETURNING id, related_order_id, related_service_id, subject, created_at, updated_at
            "#,
        )
        .bind(subject)
        .bind(related_order_id)
        .bind(related_service_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO conversation_participants (conversation_id, user_id)
            SELECT $1, UNNEST($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(conversation.id)
        .bind(participant_ids.to_vec())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(conversation)
    }

    async fn get_user_conversations(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Conversation>, Error> {
        sqlx::query_as::<_, Conversation>(
            r#"
            SELECT c.id, c.related_order_id, c.related_service_id, c.subject,
                   c.created_at, c.updated_at
            FROM conversations c
            JOIN conversation_participants cp ON cp.conversation_id = c.id
            WHERE cp.user_id = $1
            ORDER BY c.updated_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_conversation(&self, conversation_id: Uuid) -> Result<Option<Conversation>, Error> {
        sqlx::query_as::<_, Conversation>(
            r#"
            SELECT id, related_order_id, related_service_id, subject, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_participant_ids(&self, conversation_id: Uuid) -> Result<Vec<Uuid>, Error> {
        sqlx::query_scalar(
            r#"
            SELECT user_id FROM conversation_participants
            WHERE conversation_id = $1
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn send_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: String,
        message_type: MessageType,
        attachment: Option<String>,
    ) -> Result<Message, Error> {
        let mut tx = self.pool.begin().await?;

        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (conversation_id, sender_id, content, message_type, attachment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, conversation_id, sender_id, content, message_type, attachment,
                      is_read, created_at
            "#,
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(content)
        .bind(message_type)
        .bind(attachment)
        .fetch_one(&mut *tx)
        .await?;

        // The conversation sorts by its latest message.
        sqlx::query("UPDATE conversations SET updated_at = $2 WHERE id = $1")
            .bind(conversation_id)
            .bind(message.created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(message)
    }

    async fn get_messages(
        &self,
        conversation_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, Error> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, content, message_type, attachment,
                   is_read, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(conversation_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn mark_messages_as_read(
        &self,
        conversation_id: Uuid,
        reader_id: Uuid,
    ) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = TRUE
            WHERE conversation_id = $1 AND sender_id <> $2 AND is_read = FALSE
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
