use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use super::{parse_timestamp, to_timestamp};
use crate::error::Result;
use crate::models::ChatSession;

const SESSION_COLUMNS: &str =
    "id, paper_id, title, message_count, is_active, created_at, updated_at, last_message_at";

pub struct SessionRepository;

impl SessionRepository {
    pub async fn create(conn: &Connection, session: &ChatSession) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO chat_sessions (
                id, paper_id, title, message_count, is_active, created_at, updated_at, last_message_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                session.id.clone(),
                session.paper_id.clone(),
                session.title.clone(),
                session.message_count as i64,
                session.is_active as i64,
                to_timestamp(&session.created_at),
                to_timestamp(&session.updated_at),
                session.last_message_at.as_ref().map(to_timestamp),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get_by_id(conn: &Connection, id: &str) -> Result<Option<ChatSession>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM chat_sessions WHERE id = ?1");
        let mut rows = conn.query(&sql, params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_session(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn list_active_for_paper(
        conn: &Connection,
        paper_id: &str,
    ) -> Result<Vec<ChatSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM chat_sessions \
             WHERE paper_id = ?1 AND is_active = 1 \
             ORDER BY updated_at DESC, rowid DESC"
        );
        let mut rows = conn.query(&sql, params![paper_id]).await?;

        let mut sessions = Vec::new();
        while let Some(row) = rows.next().await? {
            sessions.push(Self::row_to_session(&row)?);
        }
        Ok(sessions)
    }

    pub async fn record_message(
        conn: &Connection,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let at = to_timestamp(&at);
        conn.execute(
            r#"
            UPDATE chat_sessions
            SET message_count = message_count + 1, updated_at = ?2, last_message_at = ?2
            WHERE id = ?1
            "#,
            params![session_id, at],
        )
        .await?;

        Ok(())
    }

    pub async fn deactivate(conn: &Connection, id: &str) -> Result<bool> {
        let now = to_timestamp(&Utc::now());
        let affected = conn
            .execute(
                "UPDATE chat_sessions SET is_active = 0, updated_at = ?2 WHERE id = ?1",
                params![id, now],
            )
            .await?;

        Ok(affected > 0)
    }

    fn row_to_session(row: &libsql::Row) -> Result<ChatSession> {
        Ok(ChatSession {
            id: row.get(0)?,
            paper_id: row.get(1)?,
            title: row.get(2)?,
            message_count: row.get::<i64>(3)?.max(0) as u32,
            is_active: row.get::<i64>(4)? != 0,
            created_at: parse_timestamp(&row.get::<String>(5)?),
            updated_at: parse_timestamp(&row.get::<String>(6)?),
            last_message_at: row
                .get::<Option<String>>(7)?
                .map(|value| parse_timestamp(&value)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::setup_test_db;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_and_get_session() {
        let conn = setup_test_db().await;
        let session = ChatSession::new("paper-1", "Questions about transformers");

        SessionRepository::create(&conn, &session).await.unwrap();

        let loaded = SessionRepository::get_by_id(&conn, &session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.paper_id, "paper-1");
        assert_eq!(loaded.title, "Questions about transformers");
        assert_eq!(loaded.message_count, 0);
        assert!(loaded.is_active);
        assert!(loaded.last_message_at.is_none());
    }

    #[tokio::test]
    async fn test_record_message_bumps_counter_and_timestamps() {
        let conn = setup_test_db().await;
        let session = ChatSession::new("paper-1", "Chat");
        SessionRepository::create(&conn, &session).await.unwrap();

        let at = session.created_at + Duration::seconds(5);
        SessionRepository::record_message(&conn, &session.id, at)
            .await
            .unwrap();
        SessionRepository::record_message(&conn, &session.id, at)
            .await
            .unwrap();

        let loaded = SessionRepository::get_by_id(&conn, &session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.message_count, 2);
        assert_eq!(loaded.last_message_at.unwrap().timestamp(), at.timestamp());
        assert!(loaded.updated_at > session.updated_at);
    }

    #[tokio::test]
    async fn test_list_active_orders_by_recent_activity() {
        let conn = setup_test_db().await;
        let older = ChatSession::new("paper-1", "Older");
        let newer = ChatSession::new("paper-1", "Newer");
        let other_paper = ChatSession::new("paper-2", "Elsewhere");
        for session in [&older, &newer, &other_paper] {
            SessionRepository::create(&conn, session).await.unwrap();
        }

        SessionRepository::record_message(&conn, &newer.id, Utc::now() + Duration::seconds(10))
            .await
            .unwrap();

        let sessions = SessionRepository::list_active_for_paper(&conn, "paper-1")
            .await
            .unwrap();
        let titles: Vec<&str> = sessions.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Newer", "Older"]);
    }

    #[tokio::test]
    async fn test_deactivate_hides_session_from_listing() {
        let conn = setup_test_db().await;
        let session = ChatSession::new("paper-1", "Chat");
        SessionRepository::create(&conn, &session).await.unwrap();

        assert!(SessionRepository::deactivate(&conn, &session.id).await.unwrap());
        assert!(!SessionRepository::deactivate(&conn, "missing").await.unwrap());

        let sessions = SessionRepository::list_active_for_paper(&conn, "paper-1")
            .await
            .unwrap();
        assert!(sessions.is_empty());

        let loaded = SessionRepository::get_by_id(&conn, &session.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!loaded.is_active);
    }
}
