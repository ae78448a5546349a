//! OpenAI-compatible chat completions client.
//!
//! Works with the hosted OpenAI API and with local servers exposing the
//! same surface (Ollama, vLLM, LM Studio).

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::{future, StreamExt, TryStreamExt};
use reqwest::{header, Client, Response};
use serde::{Deserialize, Serialize};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;
use tracing::{debug, info_span, Instrument};

use super::sse::{parse_line, SseEvent, SseLineCodec};
use super::{CompletionRequest, LlmClient, TextStream};
use crate::config::LlmConfig;
use crate::{AppError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Client for `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
    request_timeout: Duration,
}

/// Chat completion request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// Chat completion response body.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be constructed.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        // Streams may run long; only connect and per-read latency are bounded here.
        let http = Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(config.request_timeout())
            .build()
            .map_err(|err| AppError::Config(format!("failed to build http client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            request_timeout: config.request_timeout(),
        })
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest, stream: bool) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(WireMessage {
                role: "system",
                content: system,
            });
        }
        messages.extend(request.messages.iter().map(|turn| WireMessage {
            role: turn.role.as_str(),
            content: &turn.content,
        }));

        ChatRequest {
            model: &self.model,
            messages,
            temperature: request.temperature.unwrap_or(self.temperature),
            max_tokens: self.max_tokens,
            stream,
            response_format: request.json.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        }
    }

    async fn send(&self, request: &CompletionRequest, stream: bool) -> Result<Response> {
        let mut builder = self
            .http
            .post(self.chat_completions_url())
            .json(&self.body(request, stream));
        if !stream {
            builder = builder.timeout(self.request_timeout);
        }
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        Err(AppError::Llm(format!("upstream returned {status}: {body}")))
    }

    async fn complete_inner(&self, request: CompletionRequest) -> Result<String> {
        let response = self.send(&request, false).await?;
        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AppError::Llm("completion contained no text".into()))?;
        debug!(chars = text.len(), "completion received");
        Ok(text)
    }

    async fn stream_inner(&self, request: CompletionRequest) -> Result<TextStream> {
        let response = self.send(&request, true).await?;
        let reader = StreamReader::new(response.bytes_stream().map_err(std::io::Error::other));

        let deltas = FramedRead::new(reader, SseLineCodec::new())
            .map(|line| line.and_then(|line| parse_line(&line)))
            .take_while(|event| future::ready(!matches!(event, Ok(SseEvent::Done))))
            .filter_map(|event| {
                future::ready(match event {
                    Ok(SseEvent::Delta(text)) => Some(Ok(text)),
                    Ok(SseEvent::Done | SseEvent::Skip) => None,
                    Err(err) => Some(Err(err)),
                })
            });

        Ok(Box::pin(deltas))
    }
}

impl LlmClient for OpenAiClient {
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        let span = info_span!("llm_complete", model = %self.model, json = request.json);
        Box::pin(self.complete_inner(request).instrument(span))
    }

    fn stream(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TextStream>> + Send + '_>> {
        let span = info_span!("llm_stream", model = %self.model);
        Box::pin(self.stream_inner(request).instrument(span))
    }
}
