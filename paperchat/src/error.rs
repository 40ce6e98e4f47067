use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api::v1::response::ApiResponse;

#[derive(Error, Debug)]
pub enum PaperChatError {
    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Paper not found: {0}")]
    PaperNotFound(String),

    #[error("Paper has not been extracted: {0}")]
    PaperNotExtracted(String),

    #[error("Chat session not found: {0}")]
    SessionNotFound(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Generation timed out after {0} seconds")]
    GenerationTimeout(u64),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl PaperChatError {
    /// Expected Generation Service failures. The chat turn answers from
    /// paper metadata either way; anything else is logged as an error.
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            PaperChatError::Generation(_)
                | PaperChatError::GenerationTimeout(_)
                | PaperChatError::LlmUnavailable(_)
                | PaperChatError::LlmRateLimit { .. }
                | PaperChatError::Http(_)
        )
    }
}

/// Renders through the v1 envelope so a bare `?` in a handler produces the
/// same `{data, meta, error}` body as an explicit `ApiResponse`.
impl IntoResponse for PaperChatError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::from(self).into_response()
    }
}

pub type Result<T> = std::result::Result<T, PaperChatError>;
