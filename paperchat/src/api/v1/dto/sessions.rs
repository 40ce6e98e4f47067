//! Chat session and message DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{self, ContextMetadata, MessageRole, SelectionContext};

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub paper_id: String,
    pub title: String,
    pub message_count: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<DateTime<Utc>>,
}

impl From<models::ChatSession> for SessionResponse {
    fn from(session: models::ChatSession) -> Self {
        Self {
            session_id: session.id,
            paper_id: session.paper_id,
            title: session.title,
            message_count: session.message_count,
            is_active: session.is_active,
            created_at: session.created_at,
            updated_at: session.updated_at,
            last_message_at: session.last_message_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message_id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection_context: Option<SelectionContext>,
    /// Provenance for assistant messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_metadata: Option<ContextMetadata>,
    pub created_at: DateTime<Utc>,
}

impl From<models::ChatMessage> for MessageResponse {
    fn from(message: models::ChatMessage) -> Self {
        Self {
            message_id: message.id,
            role: message.role,
            content: message.content,
            selected_text: message.selected_text,
            selection_context: message.selection,
            context_metadata: message.context_metadata,
            created_at: message.created_at,
        }
    }
}

/// Response for `DELETE /v1/sessions/{sessionId}`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateSessionResponse {
    pub session_id: String,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_response_omits_empty_provenance() {
        let message = models::ChatMessage::user("s1", "Hello", None, None);
        let json = serde_json::to_value(MessageResponse::from(message)).expect("serialize");
        assert_eq!(json["role"], "user");
        assert!(json.get("contextMetadata").is_none());
        assert!(json.get("selectedText").is_none());
    }

    #[test]
    fn test_session_response_uses_camel_case() {
        let session = models::ChatSession::new("p1", "Chat");
        let json = serde_json::to_value(SessionResponse::from(session)).expect("serialize");
        assert_eq!(json["paperId"], "p1");
        assert_eq!(json["messageCount"], 0);
        assert_eq!(json["isActive"], true);
    }
}
