use libsql::{params, Connection};

use super::{parse_timestamp, to_timestamp};
use crate::error::Result;
use crate::models::{ChatMessage, MessageRole};

const MESSAGE_COLUMNS: &str =
    "id, session_id, role, content, selected_text, selection, context_metadata, created_at";

pub struct MessageRepository;

impl MessageRepository {
    pub async fn create(conn: &Connection, message: &ChatMessage) -> Result<()> {
        let selection = match &message.selection {
            Some(selection) => Some(serde_json::to_string(selection)?),
            None => None,
        };
        let context_metadata = match &message.context_metadata {
            Some(metadata) => Some(serde_json::to_string(metadata)?),
            None => None,
        };

        conn.execute(
            r#"
            INSERT INTO chat_messages (
                id, session_id, role, content, selected_text, selection, context_metadata, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                message.id.clone(),
                message.session_id.clone(),
                message.role.to_string(),
                message.content.clone(),
                message.selected_text.clone(),
                selection,
                context_metadata,
                to_timestamp(&message.created_at),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn list_for_session(conn: &Connection, session_id: &str) -> Result<Vec<ChatMessage>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages \
             WHERE session_id = ?1 ORDER BY created_at ASC, rowid ASC"
        );
        let mut rows = conn.query(&sql, params![session_id]).await?;

        let mut messages = Vec::new();
        while let Some(row) = rows.next().await? {
            messages.push(Self::row_to_message(&row)?);
        }
        Ok(messages)
    }

    /// Newest `limit` messages, returned oldest first.
    pub async fn recent_for_session(
        conn: &Connection,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages \
             WHERE session_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2"
        );
        let mut rows = conn.query(&sql, params![session_id, limit as i64]).await?;

        let mut messages = Vec::new();
        while let Some(row) = rows.next().await? {
            messages.push(Self::row_to_message(&row)?);
        }
        messages.reverse();
        Ok(messages)
    }

    fn row_to_message(row: &libsql::Row) -> Result<ChatMessage> {
        Ok(ChatMessage {
            id: row.get(0)?,
            session_id: row.get(1)?,
            role: row
                .get::<String>(2)?
                .parse()
                .unwrap_or(MessageRole::User),
            content: row.get(3)?,
            selected_text: row.get(4)?,
            selection: row
                .get::<Option<String>>(5)?
                .and_then(|raw| serde_json::from_str(&raw).ok()),
            context_metadata: row
                .get::<Option<String>>(6)?
                .and_then(|raw| serde_json::from_str(&raw).ok()),
            created_at: parse_timestamp(&row.get::<String>(7)?),
        })
    }
}
