use crate::db::connection::Database;
use crate::db::repository::{MessageRepository, PaperRepository, SessionRepository};
use crate::db::traits::{DatabaseBackend, MessageStore, PaperStore, SessionStore};
use crate::error::Result;
use crate::models::{ChatMessage, ChatSession, Paper};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub struct LibSqlBackend {
    db: Database,
}

impl LibSqlBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PaperStore for LibSqlBackend {
    async fn upsert_paper(&self, paper: &Paper) -> Result<()> {
        let conn = self.db.connect()?;
        PaperRepository::upsert(&conn, paper).await
    }
    async fn get_paper(&self, id: &str) -> Result<Option<Paper>> {
        let conn = self.db.connect()?;
        PaperRepository::get_by_id(&conn, id).await
    }
}

#[async_trait]
impl SessionStore for LibSqlBackend {
    async fn create_session(&self, session: &ChatSession) -> Result<()> {
        let conn = self.db.connect()?;
        SessionRepository::create(&conn, session).await
    }
    async fn get_session(&self, id: &str) -> Result<Option<ChatSession>> {
        let conn = self.db.connect()?;
        SessionRepository::get_by_id(&conn, id).await
    }
    async fn list_sessions(&self, paper_id: &str) -> Result<Vec<ChatSession>> {
        let conn = self.db.connect()?;
        SessionRepository::list_active_for_paper(&conn, paper_id).await
    }
    async fn record_message(&self, session_id: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.db.connect()?;
        SessionRepository::record_message(&conn, session_id, at).await
    }
    async fn deactivate_session(&self, id: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        SessionRepository::deactivate(&conn, id).await
    }
}

#[async_trait]
impl MessageStore for LibSqlBackend {
    async fn create_message(&self, message: &ChatMessage) -> Result<()> {
        let conn = self.db.connect()?;
        MessageRepository::create(&conn, message).await
    }
    async fn list_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let conn = self.db.connect()?;
        MessageRepository::list_for_session(&conn, session_id).await
    }
    async fn recent_messages(&self, session_id: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        let conn = self.db.connect()?;
        MessageRepository::recent_for_session(&conn, session_id, limit).await
    }
}

#[async_trait]
impl DatabaseBackend for LibSqlBackend {
    async fn sync(&self) -> Result<()> {
        self.db.sync().await
    }
}
