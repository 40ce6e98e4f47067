//! v1 Chat handlers.
//!
//! A chat turn always produces a `ChatTurnResponse`. Turn-level failures
//! (unknown paper, storage errors) are reported inside it with
//! `success: false`, so the envelope only carries errors for malformed
//! requests.

use axum::extract::{Path, State};

use crate::api::v1::dto::{ChatRequest, ContextPreviewRequest};
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;
use crate::models::ChatTurnResponse;
use crate::services::ContextPreview;

const MAX_QUERY_CHARS: usize = 4000;

fn validate_query(query: &str) -> Result<(), String> {
    if query.trim().is_empty() {
        return Err("Query cannot be empty".to_string());
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(format!("Query too long (max {MAX_QUERY_CHARS} characters)"));
    }
    Ok(())
}

/// `POST /api/v1/papers/{paperId}/chat`
///
/// Runs one chat turn: classify the question, retrieve and rank paper
/// content, generate an answer and store both messages in the session.
#[utoipa::path(
    post,
    path = "/api/v1/papers/{paperId}/chat",
    tag = "chat",
    operation_id = "chat.turn",
    params(("paperId" = String, Path, description = "Paper ID")),
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Turn outcome, check `success`", body = ChatTurnResponse),
        (status = 400, description = "Invalid request", body = ApiError),
    )
)]
pub async fn chat(
    State(state): State<AppState>,
    Path(paper_id): Path<String>,
    axum::Json(req): axum::Json<ChatRequest>,
) -> ApiResponse<ChatTurnResponse> {
    if let Err(message) = validate_query(&req.query) {
        return ApiResponse::error(ErrorCode::InvalidRequest, message);
    }

    let response = state.chat.chat(req.into_turn(paper_id)).await;
    ApiResponse::success(response)
}

/// `POST /api/v1/papers/{paperId}/context:preview`
///
/// Shows how a question would be answered: its classification, the ranked
/// content bundle and the exact prompt. Nothing is generated or stored.
#[utoipa::path(
    post,
    path = "/api/v1/papers/{paperId}/context:preview",
    tag = "chat",
    operation_id = "chat.previewContext",
    params(("paperId" = String, Path, description = "Paper ID")),
    request_body = ContextPreviewRequest,
    responses(
        (status = 200, description = "Retrieval preview", body = ContextPreview),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Paper not found", body = ApiError),
        (status = 409, description = "Paper has no completed extraction", body = ApiError),
    )
)]
pub async fn preview_context(
    State(state): State<AppState>,
    Path(paper_id): Path<String>,
    axum::Json(req): axum::Json<ContextPreviewRequest>,
) -> ApiResponse<ContextPreview> {
    if let Err(message) = validate_query(&req.query) {
        return ApiResponse::error(ErrorCode::InvalidRequest, message);
    }

    match state
        .chat
        .preview(
            &paper_id,
            &req.query,
            req.selected_text.as_deref(),
            req.page_number,
            req.session_id.as_deref(),
        )
        .await
    {
        Ok(preview) => ApiResponse::success(preview),
        Err(e) => e.into(),
    }
}
