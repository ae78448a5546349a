//! `/api/journal` handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{ApiJson, AppState, Deleted};
use crate::models::journal::JournalEntry;
use crate::Result;

pub(super) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/journal", get(list).post(create))
        .route("/api/journal/{id}", get(show).put(update).delete(remove))
        .route("/api/journal/{id}/corrections", post(correct))
}

#[derive(Debug, Deserialize)]
struct NewEntry {
    title: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct EntryChanges {
    title: Option<String>,
    content: Option<String>,
}

async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<JournalEntry>>> {
    Ok(Json(state.journal.list().await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<NewEntry>,
) -> Result<(StatusCode, Json<JournalEntry>)> {
    let entry = state.journal.create(&body.title, &body.content).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JournalEntry>> {
    Ok(Json(state.journal.get(&id).await?))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<EntryChanges>,
) -> Result<Json<JournalEntry>> {
    let entry = state
        .journal
        .update(&id, body.title.as_deref(), body.content.as_deref())
        .await?;
    Ok(Json(entry))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>> {
    state.journal.delete(&id).await?;
    Ok(Deleted::new(id))
}

async fn correct(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JournalEntry>> {
    Ok(Json(state.journal.correct(&id).await?))
}
