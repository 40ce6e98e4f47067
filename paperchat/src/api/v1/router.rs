use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::api::state::AppState;

use super::handlers;

pub fn v1_router() -> Router<AppState> {
    let papers = Router::new()
        .route("/{paperId}", get(handlers::papers::get_paper))
        .route(
            "/{paperId}/extraction",
            put(handlers::papers::register_extraction),
        )
        .route("/{paperId}/chat", post(handlers::chat::chat))
        .route(
            "/{paperId}/context:preview",
            post(handlers::chat::preview_context),
        )
        .route("/{paperId}/sessions", get(handlers::sessions::list_sessions));

    let sessions = Router::new()
        .route(
            "/{sessionId}",
            delete(handlers::sessions::deactivate_session),
        )
        .route(
            "/{sessionId}/messages",
            get(handlers::sessions::list_messages),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router())
        .nest("/papers", papers)
        .nest("/sessions", sessions)
}
