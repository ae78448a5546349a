//! Chat and message repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::Utc;

use crate::models::chat::{Chat, Message, MessageRole};
use crate::models::parse_timestamp;
use crate::{AppError, Result};

use super::db::Database;

/// Repository wrapper around `SQLite` for chats and their messages.
#[derive(Clone)]
pub struct ChatRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct ChatRow {
    id: String,
    title: String,
    topic: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ChatRow {
    fn into_chat(self) -> Result<Chat> {
        Ok(Chat {
            id: self.id,
            title: self.title,
            topic: self.topic,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            updated_at: parse_timestamp("updated_at", &self.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: String,
    chat_id: String,
    role: String,
    content: String,
    created_at: String,
}

impl MessageRow {
    fn into_message(self) -> Result<Message> {
        Ok(Message {
            id: self.id,
            chat_id: self.chat_id,
            role: parse_role(&self.role)?,
            content: self.content,
            created_at: parse_timestamp("created_at", &self.created_at)?,
        })
    }
}

fn parse_role(s: &str) -> Result<MessageRole> {
    match s {
        "user" => Ok(MessageRole::User),
        "assistant" => Ok(MessageRole::Assistant),
        "system" => Ok(MessageRole::System),
        other => Err(AppError::Db(format!("invalid message role: {other}"))),
    }
}

impl ChatRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new chat record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the database insert fails.
    pub async fn create(&self, chat: &Chat) -> Result<Chat> {
        sqlx::query(
            "INSERT INTO chat (id, title, topic, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&chat.id)
        .bind(&chat.title)
        .bind(&chat.topic)
        .bind(chat.created_at.to_rfc3339())
        .bind(chat.updated_at.to_rfc3339())
        .execute(self.db.as_ref())
        .await?;

        Ok(chat.clone())
    }

    /// Retrieve a chat by identifier.
    ///
    /// Returns `Ok(None)` if the chat does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Chat>> {
        let row: Option<ChatRow> = sqlx::query_as("SELECT * FROM chat WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(ChatRow::into_chat).transpose()
    }

    /// List all chats, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list(&self) -> Result<Vec<Chat>> {
        let rows: Vec<ChatRow> =
            sqlx::query_as("SELECT * FROM chat ORDER BY updated_at DESC, created_at DESC")
                .fetch_all(self.db.as_ref())
                .await?;

        rows.into_iter().map(ChatRow::into_chat).collect()
    }

    /// Persist a modified title/topic and bump `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the chat does not exist.
    pub async fn update(&self, chat: &Chat) -> Result<Chat> {
        let mut updated = chat.clone();
        updated.updated_at = Utc::now();

        let result =
            sqlx::query("UPDATE chat SET title = ?1, topic = ?2, updated_at = ?3 WHERE id = ?4")
                .bind(&updated.title)
                .bind(&updated.topic)
                .bind(updated.updated_at.to_rfc3339())
                .bind(&updated.id)
                .execute(self.db.as_ref())
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("chat {} not found", chat.id)));
        }
        Ok(updated)
    }

    /// Delete a chat; messages are removed by cascade.
    ///
    /// Returns `false` when no chat had the given identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM chat WHERE id = ?1")
            .bind(id)
            .execute(self.db.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Append a message and bump the owning chat's `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the insert fails (including an unknown chat).
    pub async fn add_message(&self, message: &Message) -> Result<Message> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            "INSERT INTO message (id, chat_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&message.id)
        .bind(&message.chat_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE chat SET updated_at = ?1 WHERE id = ?2")
            .bind(message.created_at.to_rfc3339())
            .bind(&message.chat_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(message.clone())
    }

    /// List every message in a chat in chronological order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT * FROM message WHERE chat_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )
        .bind(chat_id)
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(MessageRow::into_message).collect()
    }

    /// Return the newest `limit` messages of a chat, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn recent_messages(&self, chat_id: &str, limit: u32) -> Result<Vec<Message>> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT * FROM (
                 SELECT *, rowid AS seq FROM message WHERE chat_id = ?1
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2
             ) ORDER BY created_at ASC, seq ASC",
        )
        .bind(chat_id)
        .bind(i64::from(limit))
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(MessageRow::into_message).collect()
    }
}
