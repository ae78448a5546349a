//! `/api/conjugation` handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{optional_json, ApiJson, AppState};
use crate::conjugation::{
    AttemptResult, CompletionSummary, ProgressReport, RuleOverview, SessionView,
};
use crate::Result;

pub(super) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/conjugation/rules", get(rules))
        .route("/api/conjugation/progress", get(progress))
        .route("/api/conjugation/sessions", post(start_session))
        .route("/api/conjugation/sessions/{id}", get(show_session))
        .route("/api/conjugation/sessions/{id}/attempts", post(submit_attempt))
        .route("/api/conjugation/sessions/{id}/complete", post(complete_session))
}

#[derive(Debug, Default, Deserialize)]
struct NewSession {
    size: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct NewAttempt {
    drill_id: String,
    answer: String,
}

async fn rules(State(state): State<Arc<AppState>>) -> Result<Json<Vec<RuleOverview>>> {
    Ok(Json(state.drills.rules_overview().await?))
}

async fn progress(State(state): State<Arc<AppState>>) -> Result<Json<ProgressReport>> {
    Ok(Json(state.drills.progress().await?))
}

async fn start_session(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<SessionView>)> {
    let body: NewSession = optional_json(&body)?;
    let session = state.drills.start_session(body.size).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn show_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>> {
    Ok(Json(state.drills.get_session(&id).await?))
}

async fn submit_attempt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<NewAttempt>,
) -> Result<(StatusCode, Json<AttemptResult>)> {
    let result = state
        .drills
        .submit_attempt(&id, &body.drill_id, &body.answer)
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn complete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CompletionSummary>> {
    Ok(Json(state.drills.complete_session(&id).await?))
}
