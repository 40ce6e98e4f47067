use std::sync::Arc;

use chrono::Utc;

use crate::db::DatabaseBackend;
use crate::error::{PaperChatError, Result};
use crate::models::{ExtractionStatus, Paper, PaperExtraction};

/// Registers papers and their extractions.
#[derive(Clone)]
pub struct PaperService {
    db: Arc<dyn DatabaseBackend>,
}

impl PaperService {
    pub fn new(db: Arc<dyn DatabaseBackend>) -> Self {
        Self { db }
    }

    /// Store a completed extraction for `paper_id`, creating the paper when
    /// it is new. The paper title follows `title`, then the extraction's own
    /// title, then the previous title.
    pub async fn register_extraction(
        &self,
        paper_id: &str,
        title: Option<String>,
        extraction: PaperExtraction,
    ) -> Result<Paper> {
        let paper_id = paper_id.trim();
        if paper_id.is_empty() {
            return Err(PaperChatError::Validation("Paper id is required".to_string()));
        }

        let existing = self.db.get_paper(paper_id).await?;
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| Some(extraction.title.trim().to_string()).filter(|t| !t.is_empty()))
            .or_else(|| existing.as_ref().map(|p| p.title.clone()))
            .unwrap_or_else(|| "Untitled paper".to_string());

        let mut paper =
            existing.unwrap_or_else(|| Paper::new(paper_id.to_string(), title.clone()));
        paper.title = title;
        paper.extraction_status = ExtractionStatus::Completed;
        paper.updated_at = Utc::now();

        tracing::info!(
            paper_id = %paper.id,
            sections = extraction.sections.len(),
            figures = extraction.figures.len(),
            tables = extraction.tables.len(),
            equations = extraction.equations.len(),
            references = extraction.references.len(),
            "Registering paper extraction"
        );
        paper.extraction = Some(extraction);

        self.db.upsert_paper(&paper).await?;
        Ok(paper)
    }

    pub async fn get(&self, paper_id: &str) -> Result<Paper> {
        self.db
            .get_paper(paper_id)
            .await?
            .ok_or_else(|| PaperChatError::PaperNotFound(paper_id.to_string()))
    }
}
