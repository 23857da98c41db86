//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ChatRequest, ChatResponse, ErrorResponse, PendingAttachmentResponse, SessionInfoResponse,
    StageAttachmentRequest, SuccessResponse, VersionResponse,
};
use super::AppState;
use crate::render::render_transcript;
use crate::session::{AttachmentError, AttachmentMetadata, HistorySnapshot};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session info
        .route("/api/session", get(get_session))
        // Rendering sink reads
        .route("/api/history", get(get_history))
        .route("/api/transcript", get(get_transcript))
        .route("/api/stream", get(stream_history))
        // User actions
        .route("/api/attachment", post(stage_attachment).get(get_attachment))
        .route("/api/chat", post(send_chat))
        .route("/api/reset", post(reset_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Reads
// ============================================================

async fn get_session(State(state): State<AppState>) -> Json<SessionInfoResponse> {
    let session = &state.session;
    let phase = session.phase();
    Json(SessionInfoResponse {
        session_id: session.context().session_id().to_string(),
        endpoint_url: session.context().endpoint_url().to_string(),
        phase,
        busy: phase.is_busy(),
        pending_attachment: session.pending_attachment(),
    })
}

async fn get_history(State(state): State<AppState>) -> Json<HistorySnapshot> {
    Json(state.session.snapshot())
}

async fn get_transcript(State(state): State<AppState>) -> String {
    render_transcript(&state.session.snapshot().entries)
}

async fn stream_history(State(state): State<AppState>) -> impl IntoResponse {
    sse_stream(state.session.history().clone(), state.session.subscribe_phase())
}

async fn get_attachment(State(state): State<AppState>) -> Json<PendingAttachmentResponse> {
    Json(PendingAttachmentResponse {
        pending_attachment: state.session.pending_attachment(),
    })
}

// ============================================================
// User actions
// ============================================================

async fn stage_attachment(
    State(state): State<AppState>,
    Json(req): Json<StageAttachmentRequest>,
) -> Result<Json<PendingAttachmentResponse>, AppError> {
    let meta = match req.media_type.filter(|t| !t.trim().is_empty()) {
        Some(media_type) => AttachmentMetadata::new(req.name, media_type, req.size),
        None => AttachmentMetadata::guess(req.name, req.size),
    }?;
    meta.ensure_accepted()?;

    state.session.stage(meta.clone());
    Ok(Json(PendingAttachmentResponse {
        pending_attachment: Some(meta),
    }))
}

async fn send_chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Json<ChatResponse> {
    let turn = state.session.submit(&req.text).await;
    Json(ChatResponse {
        accepted: turn.is_some(),
        turn,
    })
}

async fn reset_session(State(state): State<AppState>) -> Json<SuccessResponse> {
    state.session.reset().await;
    Json(SuccessResponse { ok: true })
}

async fn get_version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================
// Errors
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
}

impl From<AttachmentError> for AppError {
    fn from(err: AttachmentError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
