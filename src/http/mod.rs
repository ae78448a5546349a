//! JSON HTTP API.
//!
//! One axum router serves every resource. Handlers translate between
//! request payloads and the service layer and return [`AppError`] on
//! failure, which renders as `{ "error": "..." }` with a matching status.

mod books;
mod chats;
mod conjugation;
mod journal;

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::chat::ChatService;
use crate::config::GlobalConfig;
use crate::conjugation::ConjugationService;
use crate::journal::JournalService;
use crate::library::Library;
use crate::llm::LlmClient;
use crate::persistence::db::Database;
use crate::{AppError, Result};

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<GlobalConfig>,
    /// Tutor chat operations.
    pub chats: ChatService,
    /// Journal operations.
    pub journal: JournalService,
    /// Conjugation drill operations.
    pub drills: ConjugationService,
    /// E-book shelf.
    pub library: Library,
}

impl AppState {
    /// Wire the services over one database pool and one model client.
    #[must_use]
    pub fn new(config: Arc<GlobalConfig>, db: Arc<Database>, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            chats: ChatService::new(Arc::clone(&db), Arc::clone(&llm), config.llm.history_limit),
            journal: JournalService::new(
                Arc::clone(&db),
                Arc::clone(&llm),
                config.max_journal_chars,
            ),
            drills: ConjugationService::new(Arc::clone(&db), llm, config.drills.clone()),
            library: Library::new(db, config.upload_dir.clone(), config.max_upload_bytes),
            config,
        }
    }
}

/// Body returned by every delete endpoint.
#[derive(Debug, Serialize)]
pub struct Deleted {
    id: String,
    deleted: bool,
}

impl Deleted {
    fn new(id: String) -> Json<Self> {
        Json(Self { id, deleted: true })
    }
}

/// JSON body extractor whose rejections render as [`AppError::Validation`].
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, AppError> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}

/// Parse a JSON body that may be omitted entirely.
fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|err| AppError::Validation(format!("invalid request body: {err}")))
}

/// Handler for `GET /health`.
async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> AppError {
    AppError::NotFound("no such route".into())
}

/// Log one line per request with its outcome and latency.
async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    if response.status().is_server_error() {
        warn!(%method, %path, status, elapsed_ms, "request completed");
    } else {
        info!(%method, %path, status, elapsed_ms, "request completed");
    }
    response
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = usize::try_from(state.config.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(64 * 1024);

    Router::new()
        .route("/health", get(health))
        .merge(chats::routes())
        .merge(journal::routes())
        .merge(conjugation::routes())
        .merge(books::routes(upload_limit))
        .fallback(not_found)
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Serve the API on `listener` until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Io` if the server fails.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    ct: CancellationToken,
) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "http api listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Io(format!("http server error: {err}")))?;

    info!("http api shut down");
    Ok(())
}

/// Spawn [`serve`] on its own task.
///
/// `ct` is cancelled when the server stops for any reason, so a failed
/// listener takes the rest of the process down with it.
#[must_use]
pub fn spawn_server(
    listener: TcpListener,
    state: Arc<AppState>,
    ct: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = serve(listener, state, ct.clone()).await {
            error!(%err, "http server failed");
        }
        ct.cancel();
    })
}
