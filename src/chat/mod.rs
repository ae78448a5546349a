//! Tutor chat: conversations, model replies and reply suggestions.

pub mod relay;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::llm::json::extract_json;
use crate::llm::{prompts, ChatTurn, CompletionRequest, LlmClient, TextStream};
use crate::models::chat::{Chat, ChatWithMessages, Message, MessageRole};
use crate::persistence::chat_repo::ChatRepo;
use crate::persistence::db::Database;
use crate::{AppError, Result};

/// Number of reply suggestions offered to the learner.
pub const SUGGESTION_COUNT: usize = 3;

/// Longest accepted chat title.
pub const MAX_TITLE_CHARS: usize = 200;

/// A learner message and the tutor reply it produced.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Exchange {
    /// The persisted learner message.
    pub user_message: Message,
    /// The persisted tutor reply.
    pub assistant_message: Message,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SuggestionPayload {
    Wrapped { suggestions: Vec<String> },
    Bare(Vec<String>),
}

/// Chat operations over the chat repository and the language model.
#[derive(Clone)]
pub struct ChatService {
    repo: ChatRepo,
    llm: Arc<dyn LlmClient>,
    history_limit: u32,
}

fn validate_title(title: Option<&str>) -> Result<()> {
    if title.is_some_and(|t| t.chars().count() > MAX_TITLE_CHARS) {
        return Err(AppError::Validation(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("content must not be empty".into()));
    }
    Ok(content.to_owned())
}

impl ChatService {
    /// Create a service backed by `db` and `llm`.
    #[must_use]
    pub fn new(db: Arc<Database>, llm: Arc<dyn LlmClient>, history_limit: u32) -> Self {
        Self {
            repo: ChatRepo::new(db),
            llm,
            history_limit,
        }
    }

    /// List chats, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list(&self) -> Result<Vec<Chat>> {
        self.repo.list().await
    }

    /// Create a chat.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an overlong title.
    pub async fn create(&self, title: Option<String>, topic: Option<String>) -> Result<Chat> {
        validate_title(title.as_deref())?;
        let chat = self.repo.create(&Chat::new(title, topic)).await?;
        info!(chat_id = %chat.id, "chat created");
        Ok(chat)
    }

    /// Load a chat and its full message history.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the chat does not exist.
    pub async fn get(&self, id: &str) -> Result<ChatWithMessages> {
        let chat = self.require(id).await?;
        let messages = self.repo.list_messages(id).await?;
        Ok(ChatWithMessages { chat, messages })
    }

    /// Change a chat's title and/or topic. An empty topic clears it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the chat does not exist and
    /// `AppError::Validation` for a blank or overlong title.
    pub async fn update(
        &self,
        id: &str,
        title: Option<String>,
        topic: Option<String>,
    ) -> Result<Chat> {
        validate_title(title.as_deref())?;
        let mut chat = self.require(id).await?;
        if let Some(title) = title {
            let title = title.trim();
            if title.is_empty() {
                return Err(AppError::Validation("title must not be empty".into()));
            }
            title.clone_into(&mut chat.title);
        }
        if let Some(topic) = topic {
            let topic = topic.trim();
            chat.topic = (!topic.is_empty()).then(|| topic.to_owned());
        }
        self.repo.update(&chat).await
    }

    /// Delete a chat and its messages.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the chat does not exist.
    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound(format!("chat {id} not found")));
        }
        info!(chat_id = %id, "chat deleted");
        Ok(())
    }

    /// Store a learner message, ask the tutor for a reply and store it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown chat,
    /// `AppError::Validation` for blank content and `AppError::Llm` if the
    /// model call fails. The learner message stays stored on model failure.
    pub async fn send_message(&self, chat_id: &str, content: &str) -> Result<Exchange> {
        let (chat, user_message) = self.store_user_message(chat_id, content).await?;
        let request = self.reply_request(&chat).await?;
        let reply = self.llm.complete(request).await?;
        let assistant_message = self.store_assistant_message(chat_id, reply).await?;
        Ok(Exchange {
            user_message,
            assistant_message,
        })
    }

    /// Store a learner message and open a streaming tutor reply.
    ///
    /// The caller persists the accumulated reply with
    /// [`ChatService::store_assistant_message`] once the stream ends.
    ///
    /// # Errors
    ///
    /// Same as [`ChatService::send_message`], for failures before the
    /// stream opens.
    pub async fn begin_stream(
        &self,
        chat_id: &str,
        content: &str,
    ) -> Result<(Message, TextStream)> {
        let (chat, user_message) = self.store_user_message(chat_id, content).await?;
        let request = self.reply_request(&chat).await?;
        let stream = self.llm.stream(request).await?;
        Ok((user_message, stream))
    }

    /// Persist a finished tutor reply.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Llm` for an empty reply and `AppError::Db` if the
    /// insert fails.
    pub async fn store_assistant_message(&self, chat_id: &str, reply: String) -> Result<Message> {
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(AppError::Llm("model returned an empty reply".into()));
        }
        let message = Message::new(
            chat_id.to_owned(),
            MessageRole::Assistant,
            reply.to_owned(),
        );
        self.repo.add_message(&message).await
    }

    /// Ask the model for short replies the learner could send next.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown chat and `AppError::Llm`
    /// if the model response holds no suggestion list.
    pub async fn suggest_replies(&self, chat_id: &str) -> Result<Vec<String>> {
        let chat = self.require(chat_id).await?;
        let history = self.history(chat_id).await?;
        let raw = self
            .llm
            .complete(prompts::reply_suggestions(
                chat.topic.as_deref(),
                &history,
                SUGGESTION_COUNT,
            ))
            .await?;

        let suggestions = match extract_json::<SuggestionPayload>(&raw)? {
            SuggestionPayload::Wrapped { suggestions } | SuggestionPayload::Bare(suggestions) => {
                suggestions
            }
        };

        let mut cleaned: Vec<String> = Vec::with_capacity(SUGGESTION_COUNT);
        for suggestion in suggestions {
            let suggestion = suggestion.trim();
            if !suggestion.is_empty() && !cleaned.iter().any(|s| s == suggestion) {
                cleaned.push(suggestion.to_owned());
            }
            if cleaned.len() == SUGGESTION_COUNT {
                break;
            }
        }
        Ok(cleaned)
    }

    async fn require(&self, id: &str) -> Result<Chat> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("chat {id} not found")))
    }

    async fn history(&self, chat_id: &str) -> Result<Vec<ChatTurn>> {
        Ok(self
            .repo
            .recent_messages(chat_id, self.history_limit)
            .await?
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(ChatTurn::from)
            .collect())
    }

    async fn store_user_message(&self, chat_id: &str, content: &str) -> Result<(Chat, Message)> {
        let content = validate_content(content)?;
        let chat = self.require(chat_id).await?;
        let message = Message::new(chat_id.to_owned(), MessageRole::User, content);
        let message = self.repo.add_message(&message).await?;
        Ok((chat, message))
    }

    async fn reply_request(&self, chat: &Chat) -> Result<CompletionRequest> {
        let history = self.history(&chat.id).await?;
        Ok(prompts::tutor_reply(chat.topic.as_deref(), history))
    }
}
