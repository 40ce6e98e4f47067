use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Paperchat API",
        version = "1.0.0",
        description = "Chat with research papers. Query-aware retrieval, ranking and prompt assembly over structured paper extractions.",
    ),
    paths(
        handlers::health::health_check,
        handlers::papers::register_extraction,
        handlers::papers::get_paper,
        handlers::chat::chat,
        handlers::chat::preview_context,
        handlers::sessions::list_sessions,
        handlers::sessions::list_messages,
        handlers::sessions::deactivate_session,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        response::ResponseMeta,
        // Papers
        dto::papers::RegisterExtractionRequest,
        dto::papers::PaperResponse,
        models::PaperExtraction,
        models::Section,
        models::Figure,
        models::Table,
        models::Equation,
        models::Reference,
        models::Author,
        models::ExtractionStatus,
        // Chat
        dto::chat::ChatRequest,
        dto::chat::ContextPreviewRequest,
        models::SelectionContext,
        models::ChatTurnResponse,
        models::ContextMetadata,
        services::ContextPreview,
        models::QueryAnalysis,
        models::QueryType,
        models::SpecificReferences,
        models::PromptStrategy,
        models::ResponseFormat,
        models::ContextualDepth,
        models::RankedContextBundle,
        models::ContentChunk,
        models::ChunkCategory,
        models::ChunkOrigin,
        // Sessions
        dto::sessions::SessionResponse,
        dto::sessions::MessageResponse,
        dto::sessions::DeactivateSessionResponse,
        models::MessageRole,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::DatabaseStatus,
        handlers::health::LlmStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "papers", description = "Paper extraction registration"),
        (name = "chat", description = "Chat turns and retrieval previews"),
        (name = "sessions", description = "Chat sessions and message history"),
    ),
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
