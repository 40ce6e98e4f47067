//! v1 Chat session handlers.

use axum::extract::{Path, State};

use crate::api::v1::dto::{DeactivateSessionResponse, MessageResponse, SessionResponse};
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::api::AppState;

/// `GET /api/v1/papers/{paperId}/sessions`
///
/// Active sessions for a paper, most recently used first.
#[utoipa::path(
    get,
    path = "/api/v1/papers/{paperId}/sessions",
    tag = "sessions",
    operation_id = "sessions.list",
    params(("paperId" = String, Path, description = "Paper ID")),
    responses(
        (status = 200, description = "Active sessions", body = Vec<SessionResponse>),
        (status = 404, description = "Paper not found", body = ApiError),
    )
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(paper_id): Path<String>,
) -> ApiResponse<Vec<SessionResponse>> {
    match state.chat.list_sessions(&paper_id).await {
        Ok(sessions) => {
            let total = sessions.len();
            let data: Vec<SessionResponse> = sessions.into_iter().map(Into::into).collect();
            ApiResponse::list(data, total)
        }
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/sessions/{sessionId}/messages`
///
/// All messages of a session in the order they were written.
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{sessionId}/messages",
    tag = "sessions",
    operation_id = "sessions.messages",
    params(("sessionId" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Chronological messages", body = Vec<MessageResponse>),
        (status = 404, description = "Session not found", body = ApiError),
    )
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResponse<Vec<MessageResponse>> {
    match state.chat.session_messages(&session_id).await {
        Ok(messages) => {
            let total = messages.len();
            let data: Vec<MessageResponse> = messages.into_iter().map(Into::into).collect();
            ApiResponse::list(data, total)
        }
        Err(e) => e.into(),
    }
}

/// `DELETE /api/v1/sessions/{sessionId}`
///
/// Deactivates a session. Its messages are kept.
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{sessionId}",
    tag = "sessions",
    operation_id = "sessions.deactivate",
    params(("sessionId" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session deactivated", body = DeactivateSessionResponse),
        (status = 404, description = "Session not found", body = ApiError),
    )
)]
pub async fn deactivate_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResponse<DeactivateSessionResponse> {
    match state.chat.deactivate_session(&session_id).await {
        Ok(()) => ApiResponse::success(DeactivateSessionResponse {
            session_id,
            is_active: false,
        }),
        Err(e) => e.into(),
    }
}
