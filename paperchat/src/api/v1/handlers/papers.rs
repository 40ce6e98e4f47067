//! v1 Paper handlers.

use axum::extract::{Path, State};

use crate::api::v1::dto::{PaperResponse, RegisterExtractionRequest};
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::api::AppState;

/// `PUT /api/v1/papers/{paperId}/extraction`
///
/// Registers or replaces the structured extraction for a paper. The paper
/// becomes available for chat immediately.
#[utoipa::path(
    put,
    path = "/api/v1/papers/{paperId}/extraction",
    tag = "papers",
    operation_id = "papers.registerExtraction",
    params(("paperId" = String, Path, description = "Paper ID")),
    request_body = RegisterExtractionRequest,
    responses(
        (status = 200, description = "Extraction stored", body = PaperResponse),
        (status = 400, description = "Invalid request", body = ApiError),
    )
)]
pub async fn register_extraction(
    State(state): State<AppState>,
    Path(paper_id): Path<String>,
    axum::Json(req): axum::Json<RegisterExtractionRequest>,
) -> ApiResponse<PaperResponse> {
    match state
        .papers
        .register_extraction(&paper_id, req.title, req.extraction)
        .await
    {
        Ok(paper) => ApiResponse::success(paper.into()),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/papers/{paperId}`
#[utoipa::path(
    get,
    path = "/api/v1/papers/{paperId}",
    tag = "papers",
    operation_id = "papers.get",
    params(("paperId" = String, Path, description = "Paper ID")),
    responses(
        (status = 200, description = "Paper summary", body = PaperResponse),
        (status = 404, description = "Paper not found", body = ApiError),
    )
)]
pub async fn get_paper(
    State(state): State<AppState>,
    Path(paper_id): Path<String>,
) -> ApiResponse<PaperResponse> {
    match state.papers.get(&paper_id).await {
        Ok(paper) => ApiResponse::success(paper.into()),
        Err(e) => e.into(),
    }
}
