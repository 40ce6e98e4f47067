use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ContextMetadata;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(format!("Unknown message role: {s}")),
        }
    }
}

/// Where in the reader the user's selection sits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectionContext {
    /// Character offset where the selection starts.
    pub from: u32,
    /// Character offset where the selection ends. Equal to `from` for a bare cursor.
    pub to: u32,
    pub page_number: Option<u32>,
    pub section_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub paper_id: String,
    pub title: String,
    pub message_count: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl ChatSession {
    pub fn new(paper_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: nanoid::nanoid!(),
            paper_id: paper_id.into(),
            title: title.into(),
            message_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_message_at: None,
        }
    }

    /// True when this session may continue a conversation about `paper_id`.
    pub fn accepts(&self, paper_id: &str) -> bool {
        self.is_active && self.paper_id == paper_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub session_id: String,
    pub role: MessageRole,
    pub content: String,
    pub selected_text: Option<String>,
    pub selection: Option<SelectionContext>,
    pub context_metadata: Option<ContextMetadata>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(
        session_id: impl Into<String>,
        content: impl Into<String>,
        selected_text: Option<String>,
        selection: Option<SelectionContext>,
    ) -> Self {
        Self {
            id: nanoid::nanoid!(),
            session_id: session_id.into(),
            role: MessageRole::User,
            content: content.into(),
            selected_text,
            selection,
            context_metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(
        session_id: impl Into<String>,
        content: impl Into<String>,
        context_metadata: ContextMetadata,
    ) -> Self {
        Self {
            id: nanoid::nanoid!(),
            session_id: session_id.into(),
            role: MessageRole::Assistant,
            content: content.into(),
            selected_text: None,
            selection: None,
            context_metadata: Some(context_metadata),
            created_at: Utc::now(),
        }
    }
}

/// Input to one chat turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatTurnRequest {
    pub paper_id: String,
    pub query: String,
    pub selected_text: Option<String>,
    pub selection_context: Option<SelectionContext>,
    pub session_id: Option<String>,
}

impl ChatTurnRequest {
    pub fn new(paper_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            paper_id: paper_id.into(),
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_selection(mut self, selected_text: impl Into<String>) -> Self {
        self.selected_text = Some(selected_text.into());
        self
    }

    pub fn in_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// The selected text, when it has any non-whitespace content.
    pub fn selection_text(&self) -> Option<&str> {
        self.selected_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Outcome of one chat turn. Failures are reported through `success` and
/// `error` rather than as an `Err`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnResponse {
    pub session_id: Option<String>,
    pub response_text: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_metadata: Option<ContextMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatTurnResponse {
    pub fn ok(
        session_id: impl Into<String>,
        response_text: impl Into<String>,
        context_metadata: ContextMetadata,
    ) -> Self {
        Self {
            session_id: Some(session_id.into()),
            response_text: response_text.into(),
            timestamp: Utc::now(),
            success: true,
            context_metadata: Some(context_metadata),
            error: None,
        }
    }

    pub fn failed(
        session_id: Option<String>,
        response_text: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            session_id,
            response_text: response_text.into(),
            timestamp: Utc::now(),
            success: false,
            context_metadata: None,
            error: Some(error.into()),
        }
    }
}
