//! `/api/books` handlers.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::{ApiJson, AppState, Deleted};
use crate::library::{Upload, EPUB_CONTENT_TYPE};
use crate::models::book::{Book, ReadingProgress};
use crate::{AppError, Result};

pub(super) fn routes(upload_limit: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/books",
            get(list)
                .post(upload)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/books/{id}", get(show).delete(remove))
        .route("/api/books/{id}/file", get(download))
        .route("/api/books/{id}/progress", get(progress).put(save_progress))
}

#[derive(Debug, Deserialize)]
struct ProgressBody {
    location: Option<String>,
    percentage: f64,
}

async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Book>>> {
    Ok(Json(state.library.list().await?))
}

fn multipart_error(err: &impl std::fmt::Display) -> AppError {
    AppError::Validation(format!("invalid upload: {err}"))
}

/// Collect the `file`, `title` and `author` fields of an upload form.
async fn read_upload(mut multipart: Multipart) -> Result<Upload> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut title = None;
    let mut author = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(&err))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let bytes = field.bytes().await.map_err(|err| multipart_error(&err))?;
                file = Some((file_name, bytes.to_vec()));
            }
            "title" => {
                title = Some(field.text().await.map_err(|err| multipart_error(&err))?);
            }
            "author" => {
                author = Some(field.text().await.map_err(|err| multipart_error(&err))?);
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| AppError::Validation("missing file field".into()))?;
    Ok(Upload {
        file_name,
        bytes,
        title,
        author,
    })
}

async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Book>)> {
    let multipart = multipart.map_err(|rejection| multipart_error(&rejection.body_text()))?;
    let stored = state.library.upload(read_upload(multipart).await?).await?;
    let status = if stored.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(stored.book)))
}

async fn show(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Json<Book>> {
    Ok(Json(state.library.get(&id).await?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>> {
    state.library.delete(&id).await?;
    Ok(Deleted::new(id))
}

async fn download(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Response> {
    let (book, bytes) = state.library.read_file(&id).await?;
    let disposition = HeaderValue::from_str(&format!(
        "inline; filename=\"{}\"",
        book.file_name.replace(['"', '\\'], "")
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("inline"));
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(EPUB_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ReadingProgress>> {
    Ok(Json(state.library.progress(&id).await?))
}

async fn save_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ProgressBody>,
) -> Result<Json<ReadingProgress>> {
    let progress = state
        .library
        .save_progress(&id, body.location, body.percentage)
        .await?;
    Ok(Json(progress))
}
