//! Language model abstraction.
//!
//! The [`LlmClient`] trait decouples the chat, journal and conjugation
//! services from the concrete model provider. [`openai::OpenAiClient`]
//! speaks the OpenAI-compatible chat completions API; tests substitute
//! scripted implementations.

pub mod json;
pub mod openai;
pub mod prompts;
pub mod sse;

use std::future::Future;
use std::pin::Pin;

use futures_util::Stream;
use serde::{Deserialize, Serialize};

use crate::models::chat::{Message, MessageRole};
use crate::Result;

/// Incremental text fragments produced by a streaming completion.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// One turn of conversation sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTurn {
    /// Author role.
    pub role: MessageRole,
    /// Turn text.
    pub content: String,
}

impl ChatTurn {
    /// A learner turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Provider-neutral completion request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    /// Instruction placed ahead of the conversation.
    pub system: Option<String>,
    /// Conversation turns in chronological order.
    pub messages: Vec<ChatTurn>,
    /// Ask the provider for a JSON object response.
    pub json: bool,
    /// Overrides the configured sampling temperature.
    pub temperature: Option<f32>,
}

/// Interface between the application services and a hosted language model.
pub trait LlmClient: Send + Sync {
    /// Run a completion and return the full response text.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Llm`](crate::AppError::Llm) if the request fails or
    /// the response carries no text.
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;

    /// Run a completion and return the response as incremental text deltas.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Llm`](crate::AppError::Llm) if the request cannot be
    /// started. Failures after the stream opened are yielded as stream items.
    fn stream(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TextStream>> + Send + '_>>;
}
