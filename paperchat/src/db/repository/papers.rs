use libsql::{params, Connection};

use super::{parse_timestamp, to_timestamp};
use crate::error::Result;
use crate::models::{ExtractionStatus, Paper};

pub struct PaperRepository;

impl PaperRepository {
    pub async fn upsert(conn: &Connection, paper: &Paper) -> Result<()> {
        let extraction = match &paper.extraction {
            Some(extraction) => Some(serde_json::to_string(extraction)?),
            None => None,
        };

        conn.execute(
            r#"
            INSERT INTO papers (id, title, extraction_status, extraction, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                extraction_status = excluded.extraction_status,
                extraction = excluded.extraction,
                updated_at = excluded.updated_at
            "#,
            params![
                paper.id.clone(),
                paper.title.clone(),
                paper.extraction_status.to_string(),
                extraction,
                to_timestamp(&paper.created_at),
                to_timestamp(&paper.updated_at),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Paper>> {
        let mut rows = conn
            .query(
                "SELECT id, title, extraction_status, extraction, created_at, updated_at FROM papers WHERE id = ?1",
                params![id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_paper(&row)?))
        } else {
            Ok(None)
        }
    }

    fn row_to_paper(row: &libsql::Row) -> Result<Paper> {
        let id: String = row.get(0)?;
        let extraction = match row.get::<Option<String>>(3)? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(extraction) => Some(extraction),
                Err(e) => {
                    tracing::warn!(paper_id = %id, error = %e, "Stored extraction is unreadable");
                    None
                }
            },
            None => None,
        };

        Ok(Paper {
            title: row.get(1)?,
            extraction_status: row
                .get::<String>(2)?
                .parse()
                .unwrap_or(ExtractionStatus::Failed),
            extraction,
            created_at: parse_timestamp(&row.get::<String>(4)?),
            updated_at: parse_timestamp(&row.get::<String>(5)?),
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::setup_test_db;
    use crate::models::PaperExtraction;

    fn extracted_paper(id: &str) -> Paper {
        let mut paper = Paper::new(id.to_string(), "Attention Is All You Need".to_string());
        paper.extraction_status = ExtractionStatus::Completed;
        paper.extraction = Some(PaperExtraction {
            title: "Attention Is All You Need".to_string(),
            abstract_text: "We propose the Transformer.".to_string(),
            ..Default::default()
        });
        paper
    }

    #[tokio::test]
    async fn test_upsert_and_get_paper() {
        let conn = setup_test_db().await;
        let paper = extracted_paper("paper-1");

        PaperRepository::upsert(&conn, &paper).await.unwrap();

        let loaded = PaperRepository::get_by_id(&conn, "paper-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.title, paper.title);
        assert_eq!(loaded.extraction_status, ExtractionStatus::Completed);
        let extraction = loaded.completed_extraction().unwrap();
        assert_eq!(extraction.abstract_text, "We propose the Transformer.");
    }

    #[tokio::test]
    async fn test_upsert_replaces_extraction() {
        let conn = setup_test_db().await;
        let mut paper = Paper::new("paper-2".to_string(), "Draft".to_string());
        PaperRepository::upsert(&conn, &paper).await.unwrap();

        paper.title = "Final".to_string();
        paper.extraction_status = ExtractionStatus::Completed;
        paper.extraction = Some(PaperExtraction::default());
        PaperRepository::upsert(&conn, &paper).await.unwrap();

        let loaded = PaperRepository::get_by_id(&conn, "paper-2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.title, "Final");
        assert!(loaded.extraction.is_some());
    }

    #[tokio::test]
    async fn test_get_missing_paper() {
        let conn = setup_test_db().await;
        let loaded = PaperRepository::get_by_id(&conn, "nope").await.unwrap();
        assert!(loaded.is_none());
    }
}
