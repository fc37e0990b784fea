//! HTTP endpoints: email processing, static front end, health.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use crate::error::ProcessError;
use crate::pipeline::{Pipeline, ProcessedEmail};

const INDEX_HTML: &str = include_str!("../static/index.html");
const SCRIPT_JS: &str = include_str!("../static/script.js");

/// Multipart field carrying the uploaded email.
const FILE_FIELD: &str = "email_file";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

/// Build the Axum router.
pub fn app_routes(pipeline: Arc<Pipeline>, max_upload_bytes: usize) -> Router {
    let state = AppState { pipeline };

    Router::new()
        .route("/", get(index))
        .route("/static/script.js", get(script))
        .route("/health", get(health))
        .route("/process", post(process_email))
        .route("/process_file", post(process_file))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Static ──────────────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        SCRIPT_JS,
    )
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "email-classifier",
        "strategy": state.pipeline.strategy().as_str(),
    }))
}

// ── Processing ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ProcessRequest {
    email_content: Option<String>,
}

/// POST /process
///
/// Body: `{"email_content": "..."}`. A missing field is a bad request; an
/// empty or whitespace-only one is rejected by the pipeline as empty content.
async fn process_email(
    State(state): State<AppState>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<ProcessedEmail>, ProcessError> {
    let span = info_span!("process", request_id = %Uuid::new_v4());
    async move {
        let Json(request) = payload.map_err(|e| {
            ProcessError::bad_request(format!(
                "Invalid request, expected JSON with 'email_content': {}",
                e.body_text()
            ))
        })?;

        let content = request
            .email_content
            .ok_or_else(|| ProcessError::bad_request("No email content provided"))?;

        state.pipeline.process_text(content).await.map(Json)
    }
    .instrument(span)
    .await
}

/// POST /process_file
///
/// Multipart upload with the email in the `email_file` field (`.txt`/`.pdf`).
async fn process_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProcessedEmail>, ProcessError> {
    let span = info_span!("process_file", request_id = %Uuid::new_v4());
    async move {
        let mut multipart = multipart.map_err(|e| {
            ProcessError::bad_request(format!("Expected a multipart upload: {}", e.body_text()))
        })?;

        let mut upload = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ProcessError::bad_request(format!("Malformed upload: {}", e.body_text())))?
        {
            if field.name() != Some(FILE_FIELD) {
                debug!(field = ?field.name(), "Skipping multipart field");
                continue;
            }
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(|e| {
                ProcessError::bad_request(format!("Failed to read upload: {}", e.body_text()))
            })?;
            upload = Some((filename, bytes.to_vec()));
            break;
        }

        let (filename, bytes) = upload.ok_or_else(|| {
            ProcessError::bad_request(format!("No file uploaded (expected field '{FILE_FIELD}')"))
        })?;
        debug!(filename = %filename, bytes = bytes.len(), "Received upload");

        state.pipeline.process_file(filename, bytes).await.map(Json)
    }
    .instrument(span)
    .await
}
