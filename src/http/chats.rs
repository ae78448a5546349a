//! `/api/chats` handlers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use super::{optional_json, ApiJson, AppState, Deleted};
use crate::chat::relay::{relay, RelayEvent};
use crate::chat::Exchange;
use crate::models::chat::{Chat, ChatWithMessages};
use crate::Result;

pub(super) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chats", get(list).post(create))
        .route("/api/chats/{id}", get(show).patch(update).delete(remove))
        .route("/api/chats/{id}/messages", post(send_message))
        .route("/api/chats/{id}/messages/stream", post(stream_message))
        .route("/api/chats/{id}/suggestions", post(suggestions))
}

#[derive(Debug, Default, Deserialize)]
struct ChatBody {
    title: Option<String>,
    topic: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    content: String,
}

#[derive(Debug, Serialize)]
struct Suggestions {
    suggestions: Vec<String>,
}

async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Chat>>> {
    Ok(Json(state.chats.list().await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Chat>)> {
    let body: ChatBody = optional_json(&body)?;
    let chat = state.chats.create(body.title, body.topic).await?;
    Ok((StatusCode::CREATED, Json(chat)))
}

async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ChatWithMessages>> {
    Ok(Json(state.chats.get(&id).await?))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ChatBody>,
) -> Result<Json<Chat>> {
    Ok(Json(state.chats.update(&id, body.title, body.topic).await?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>> {
    state.chats.delete(&id).await?;
    Ok(Deleted::new(id))
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<MessageBody>,
) -> Result<(StatusCode, Json<Exchange>)> {
    let exchange = state.chats.send_message(&id, &body.content).await?;
    Ok((StatusCode::CREATED, Json(exchange)))
}

fn to_event(event: RelayEvent) -> Event {
    let encoded = match event {
        RelayEvent::Delta(text) => Event::default()
            .event("delta")
            .json_data(serde_json::json!({ "text": text })),
        RelayEvent::Done(message) => Event::default().event("done").json_data(&message),
        RelayEvent::Error(error) => Event::default()
            .event("error")
            .json_data(serde_json::json!({ "error": error })),
    };
    encoded.unwrap_or_else(|_| Event::default().event("error").data("encoding failed"))
}

async fn stream_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<MessageBody>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let (_user_message, upstream) = state.chats.begin_stream(&id, &body.content).await?;
    let events = relay(state.chats.clone(), id, upstream).map(|event| Ok(to_event(event)));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

async fn suggestions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Suggestions>> {
    let suggestions = state.chats.suggest_replies(&id).await?;
    Ok(Json(Suggestions { suggestions }))
}
