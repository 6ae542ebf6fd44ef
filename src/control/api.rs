use crate::control::job::{JobController, PauseOutcome, StartOutcome};
use crate::storage::{JsonlDataset, DOWNLOAD_FILE_NAME};
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;

/// Lines returned by `/peek`
const PEEK_LINES: usize = 5;

/// Shared state for the control API handlers
#[derive(Clone)]
pub struct ApiState {
    controller: Arc<JobController>,
    dataset: JsonlDataset,
}

impl ApiState {
    pub fn new(controller: Arc<JobController>) -> Self {
        let dataset = controller.coordinator().dataset().clone();
        Self {
            controller,
            dataset,
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum PeekBody {
    Lines { lines: Vec<String> },
    Missing { error: &'static str },
}

#[derive(Debug, Serialize)]
struct FilesBody {
    files: Vec<String>,
}

type ApiError = (StatusCode, Json<ErrorBody>);

/// Builds the control API router
///
/// # Routes
///
/// | Route | Handler |
/// |-------|---------|
/// | `GET /` | health check |
/// | `GET /count` | dataset line count |
/// | `GET /download` | dataset file |
/// | `GET /peek` | first dataset lines |
/// | `GET /ls` | files next to the dataset |
/// | `POST /start` | launch the crawl job |
/// | `POST /pause` | stop the crawl job |
/// | `GET /status` | whether the job is running |
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/count", get(count))
        .route("/download", get(download))
        .route("/peek", get(peek))
        .route("/ls", get(list_files))
        .route("/start", post(start))
        .route("/pause", post(pause))
        .route("/status", get(status))
        .with_state(state)
}

/// Serves the control API on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: ApiState, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Control API listening on http://{}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn root() -> Json<StatusBody> {
    Json(StatusBody { status: "ok" })
}

async fn count(State(state): State<ApiState>) -> Result<String, ApiError> {
    let dataset = state.dataset.clone();
    let lines = tokio::task::spawn_blocking(move || dataset.count_records())
        .await
        .map_err(internal_error)?
        .map_err(internal_error)?;
    Ok(lines.to_string())
}

async fn download(State(state): State<ApiState>) -> Response {
    let file = match tokio::fs::File::open(state.dataset.path()).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return (StatusCode::NOT_FOUND, "File not found").into_response();
        }
        Err(e) => return internal_error(e).into_response(),
    };

    let disposition = format!("attachment; filename=\"{}\"", DOWNLOAD_FILE_NAME);
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response()
}

async fn peek(State(state): State<ApiState>) -> Result<Json<PeekBody>, ApiError> {
    let dataset = state.dataset.clone();
    let lines = tokio::task::spawn_blocking(move || dataset.peek(PEEK_LINES))
        .await
        .map_err(internal_error)?
        .map_err(internal_error)?;

    Ok(Json(match lines {
        Some(lines) => PeekBody::Lines { lines },
        None => PeekBody::Missing {
            error: "file not found",
        },
    }))
}

async fn list_files(State(state): State<ApiState>) -> Result<Json<FilesBody>, ApiError> {
    let dataset = state.dataset.clone();
    let files = tokio::task::spawn_blocking(move || dataset.list_storage_dir())
        .await
        .map_err(internal_error)?
        .map_err(internal_error)?;
    Ok(Json(FilesBody { files }))
}

async fn start(State(state): State<ApiState>) -> Result<Json<StatusBody>, ApiError> {
    let outcome = state.controller.start().await.map_err(|e| {
        tracing::error!("Failed to start crawl job: {}", e);
        internal_error(e)
    })?;

    let status = match outcome {
        StartOutcome::Started => "started",
        StartOutcome::AlreadyRunning => "already running",
    };
    Ok(Json(StatusBody { status }))
}

async fn pause(State(state): State<ApiState>) -> Json<StatusBody> {
    let status = match state.controller.pause().await {
        PauseOutcome::Paused => "paused",
        PauseOutcome::NotRunning => "not running",
    };
    Json(StatusBody { status })
}

async fn status(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.controller.status().await)
}

fn internal_error(err: impl Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}
