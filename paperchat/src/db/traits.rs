use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{ChatMessage, ChatSession, Paper};

/// Papers and their extractions.
#[async_trait]
pub trait PaperStore: Send + Sync {
    /// Insert or replace a paper, keeping its original creation time.
    async fn upsert_paper(&self, paper: &Paper) -> Result<()>;
    async fn get_paper(&self, id: &str) -> Result<Option<Paper>>;
}

/// Chat sessions keyed by id and owning paper.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, session: &ChatSession) -> Result<()>;
    async fn get_session(&self, id: &str) -> Result<Option<ChatSession>>;

    /// Active sessions for a paper, most recently updated first.
    async fn list_sessions(&self, paper_id: &str) -> Result<Vec<ChatSession>>;

    /// Bump the message counter and timestamps after a message is stored.
    async fn record_message(&self, session_id: &str, at: DateTime<Utc>) -> Result<()>;

    /// Returns false when no session has this id.
    async fn deactivate_session(&self, id: &str) -> Result<bool>;
}

/// Chat messages, returned in timestamp order.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create_message(&self, message: &ChatMessage) -> Result<()>;
    async fn list_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>>;

    /// The last `limit` messages of a session, oldest first.
    async fn recent_messages(&self, session_id: &str, limit: usize) -> Result<Vec<ChatMessage>>;
}

/// A complete database backend that combines all store traits plus lifecycle
/// operations.
#[async_trait]
pub trait DatabaseBackend: PaperStore + SessionStore + MessageStore {
    /// Sync with remote (e.g. Turso replication). No-op for local-only backends.
    async fn sync(&self) -> Result<()>;
}
