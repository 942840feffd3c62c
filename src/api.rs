//! REST API Server for the voice assistant
//!
//! Exposes the session pipeline and the supervisor over HTTP and serves the
//! synthesized audio files.

use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart,
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::{AssistantError, TranscriptionError};
use crate::models::{Conversation, PipelineResponse, Turn};
use crate::pipeline::SessionPipeline;

/// Upper bound on uploaded audio
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const BAD_UPLOAD: &str = "Expected a multipart upload with an audio 'file' field";
const BAD_CONVERSATION: &str =
    "Expected a JSON body of the form {\"messages\": [{\"role\", \"content\"}]}";

/// =============================
/// Request / Response Models
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct SupervisorRequest {
    pub messages: Vec<Turn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SupervisorResponse {
    /// Full trace; the last assistant turn is the answer
    pub messages: Conversation,
}

/// Body of every failed request
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SessionPipeline>,
}

/// =============================
/// Error Mapping
/// =============================

pub struct ApiError(AssistantError);

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        Self(err)
    }
}

fn invalid_input(message: impl Into<String>) -> ApiError {
    ApiError(AssistantError::InvalidToolInput(message.into()))
}

/// Extractor and parser detail stays in the log; the caller gets `message`
fn rejected(message: &'static str, detail: impl Display) -> ApiError {
    warn!(%detail, "Malformed request");
    invalid_input(message)
}

fn status_for(err: &AssistantError) -> StatusCode {
    match err {
        AssistantError::Transcription(TranscriptionError::Unintelligible)
        | AssistantError::InvalidToolInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AssistantError::Transcription(TranscriptionError::ServiceUnavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        AssistantError::Oracle(_) | AssistantError::Synthesis(_) => StatusCode::BAD_GATEWAY,
        AssistantError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self.0, "Request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.0.user_message(),
            }),
        )
            .into_response()
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Voice Endpoint
/// =============================

async fn read_file_field(multipart: &mut Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejected(BAD_UPLOAD, e))?
    {
        if field.name() == Some("file") {
            return field
                .bytes()
                .await
                .map_err(|e| rejected(BAD_UPLOAD, e));
        }
    }

    Err(invalid_input(BAD_UPLOAD))
}

async fn transcribe(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PipelineResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| rejected(BAD_UPLOAD, e.body_text()))?;
    let audio = read_file_field(&mut multipart).await?;
    info!(bytes = audio.len(), "Received audio upload");

    let response = state.pipeline.process(&audio).await?;
    Ok(Json(response))
}

/// =============================
/// Supervisor Endpoint
/// =============================

async fn supervise(
    State(state): State<AppState>,
    payload: Result<Json<SupervisorRequest>, JsonRejection>,
) -> Result<Json<SupervisorResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| rejected(BAD_CONVERSATION, e.body_text()))?;
    info!(turns = request.messages.len(), "Received supervisor request");

    let trace = state
        .pipeline
        .supervise(Conversation::new(request.messages))
        .await?;
    Ok(Json(SupervisorResponse { messages: trace }))
}

/// =============================
/// Router
/// =============================

pub fn create_router(pipeline: Arc<SessionPipeline>, static_dir: impl Into<PathBuf>) -> Router {
    let state = AppState { pipeline };

    Router::new()
        .route("/health", get(health))
        .route("/transcribe/", post(transcribe))
        .route("/api/supervisor", post(supervise))
        .nest_service("/static", ServeDir::new(static_dir.into()))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    pipeline: Arc<SessionPipeline>,
    config: &AppConfig,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    tokio::fs::create_dir_all(&config.static_dir).await?;

    let router = create_router(pipeline, config.static_dir.clone());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", config.port);
    info!("Local: http://127.0.0.1:{}", config.port);

    axum::serve(listener, router).await?;

    Ok(())
}
