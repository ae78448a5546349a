//! Chat conversation and message models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to chats created without one.
pub const DEFAULT_CHAT_TITLE: &str = "Nueva conversación";

/// Author of a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Written by the learner.
    User,
    /// Generated by the tutor model.
    Assistant,
    /// Instruction injected ahead of the conversation.
    System,
}

impl MessageRole {
    /// Database and wire representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// A tutoring conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chat {
    /// Unique record identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Optional conversation theme steering the tutor (e.g. "ordering food").
    pub topic: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification or message timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Construct a new chat, falling back to [`DEFAULT_CHAT_TITLE`].
    #[must_use]
    pub fn new(title: Option<String>, topic: Option<String>) -> Self {
        let now = Utc::now();
        let title = title
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_CHAT_TITLE.to_owned());
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            topic: topic
                .map(|t| t.trim().to_owned())
                .filter(|t| !t.is_empty()),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single message inside a chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Unique record identifier.
    pub id: String,
    /// Owning chat identifier.
    pub chat_id: String,
    /// Author role.
    pub role: MessageRole,
    /// Message text.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Construct a new message stamped with the current time.
    #[must_use]
    pub fn new(chat_id: String, role: MessageRole, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            chat_id,
            role,
            content,
            created_at: Utc::now(),
        }
    }
}

/// A chat together with its ordered message history.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatWithMessages {
    /// The chat record.
    #[serde(flatten)]
    pub chat: Chat,
    /// Messages in chronological order.
    pub messages: Vec<Message>,
}
