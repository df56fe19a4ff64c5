//! PostgreSQL messaging adapter
//!
//! ```sql
//! CREATE TABLE conversations (
//!     id         UUID PRIMARY KEY,
//!     user_id    UUID        NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE messages (
//!     id              UUID PRIMARY KEY,
//!     conversation_id UUID        NOT NULL REFERENCES conversations (id) ON DELETE CASCADE,
//!     user_id         UUID        NOT NULL,
//!     content         TEXT        NOT NULL,
//!     sent_at         TIMESTAMPTZ NOT NULL
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use core_kernel::{
    ConversationId, DomainPort, HealthCheckResult, HealthCheckable, MessageId, OperationMetadata, PortError, UserId,
};
use domain_messaging::{Conversation, Message, MessagingPort};

use super::port_err;
use crate::pool::check_pool;

#[derive(Debug, FromRow)]
struct ConversationRow {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<ConversationRow> for Conversation {
    fn from(row: ConversationRow) -> Self {
        Conversation {
            id: ConversationId::from(row.id),
            user_id: UserId::from(row.user_id),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MessageRow {
    id: Uuid,
    conversation_id: Uuid,
    user_id: Uuid,
    content: String,
    sent_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: MessageId::from(row.id),
            conversation_id: ConversationId::from(row.conversation_id),
            user_id: UserId::from(row.user_id),
            content: row.content,
            sent_at: row.sent_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresMessagingAdapter {
    pool: PgPool,
}

impl PostgresMessagingAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn messages_where(&self, column: &str, id: Uuid) -> Result<Vec<Message>, PortError> {
        let rows: Vec<MessageRow> = sqlx::query_as(&format!(
            "SELECT id, conversation_id, user_id, content, sent_at FROM messages \
             WHERE {} = $1 ORDER BY sent_at, id",
            column
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(port_err)?;
        Ok(rows.into_iter().map(Message::from).collect())
    }
}

impl DomainPort for PostgresMessagingAdapter {}

#[async_trait]
impl HealthCheckable for PostgresMessagingAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        check_pool(&self.pool, "postgres-messaging-adapter").await
    }
}

#[async_trait]
impl MessagingPort for PostgresMessagingAdapter {
    #[instrument(skip(self, conversation, _metadata), fields(conversation_id = %conversation.id))]
    async fn create_conversation(
        &self,
        conversation: Conversation,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Conversation, PortError> {
        sqlx::query("INSERT INTO conversations (id, user_id, created_at) VALUES ($1, $2, $3)")
            .bind(*conversation.id.as_uuid())
            .bind(*conversation.user_id.as_uuid())
            .bind(conversation.created_at)
            .execute(&self.pool)
            .await
            .map_err(port_err)?;
        Ok(conversation)
    }

    async fn get_conversation(
        &self,
        id: ConversationId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Conversation, PortError> {
        let row: Option<ConversationRow> =
            sqlx::query_as("SELECT id, user_id, created_at FROM conversations WHERE id = $1")
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(port_err)?;
        row.map(Conversation::from)
            .ok_or_else(|| PortError::not_found("Conversation", id))
    }

    async fn conversations_of_user(
        &self,
        user_id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Conversation>, PortError> {
        let rows: Vec<ConversationRow> =
            sqlx::query_as("SELECT id, user_id, created_at FROM conversations WHERE user_id = $1 ORDER BY id")
                .bind(*user_id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(port_err)?;
        Ok(rows.into_iter().map(Conversation::from).collect())
    }

    /// Messages for an unknown conversation are rejected as `NotFound`
    #[instrument(skip(self, message, _metadata), fields(conversation_id = %message.conversation_id))]
    async fn add_message(&self, message: Message, _metadata: Option<OperationMetadata>) -> Result<Message, PortError> {
        let result = sqlx::query(
            "INSERT INTO messages (id, conversation_id, user_id, content, sent_at) \
             SELECT $1, $2, $3, $4, $5 WHERE EXISTS (SELECT 1 FROM conversations WHERE id = $2)",
        )
        .bind(*message.id.as_uuid())
        .bind(*message.conversation_id.as_uuid())
        .bind(*message.user_id.as_uuid())
        .bind(&message.content)
        .bind(message.sent_at)
        .execute(&self.pool)
        .await
        .map_err(port_err)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Conversation", message.conversation_id));
        }
        Ok(message)
    }

    async fn messages_of_conversation(
        &self,
        id: ConversationId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Message>, PortError> {
        self.messages_where("conversation_id", *id.as_uuid()).await
    }

    async fn messages_of_user(
        &self,
        user_id: UserId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Message>, PortError> {
        self.messages_where("user_id", *user_id.as_uuid()).await
    }
}
