//! Chat turn DTOs for the v1 API.

use serde::Deserialize;

use crate::models::{ChatTurnRequest, SelectionContext};

/// Request body for `POST /v1/papers/{paperId}/chat`.
///
/// The response is the chat turn outcome itself (`ChatTurnResponse`).
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user's question.
    pub query: String,
    /// Text the user highlighted in the reader, if any.
    pub selected_text: Option<String>,
    /// Where the highlighted text sits in the paper.
    pub selection_context: Option<SelectionContext>,
    /// Session to continue. A new session is started when absent.
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn into_turn(self, paper_id: String) -> ChatTurnRequest {
        ChatTurnRequest {
            paper_id,
            query: self.query,
            selected_text: self.selected_text,
            selection_context: self.selection_context,
            session_id: self.session_id,
        }
    }
}

/// Request body for `POST /v1/papers/{paperId}/context:preview`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContextPreviewRequest {
    pub query: String,
    pub selected_text: Option<String>,
    /// Page the selection came from.
    pub page_number: Option<u32>,
    /// Session whose recent history is rendered into the prompt.
    pub session_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_deserializes_selection() {
        let json = r#"{
            "query": "What does this mean?",
            "selectedText": "multi-head attention",
            "selectionContext": {"from": 10, "to": 30, "pageNumber": 4},
            "sessionId": "abc"
        }"#;
        let req: ChatRequest = serde_json::from_str(json).expect("deserialize");
        let turn = req.into_turn("paper-1".to_string());
        assert_eq!(turn.paper_id, "paper-1");
        assert_eq!(turn.selection_text(), Some("multi-head attention"));
        let ctx = turn.selection_context.expect("selection context");
        assert_eq!(ctx.page_number, Some(4));
        assert_eq!(turn.session_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_chat_request_minimal() {
        let req: ChatRequest =
            serde_json::from_str(r#"{"query": "Summarize this paper"}"#).expect("deserialize");
        assert!(req.selected_text.is_none());
        assert!(req.session_id.is_none());
    }
}
