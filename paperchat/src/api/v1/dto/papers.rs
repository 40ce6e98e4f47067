//! Paper registration DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{self, ExtractionStatus, PaperExtraction};

/// Request body for `PUT /v1/papers/{paperId}/extraction`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterExtractionRequest {
    /// Display title. Defaults to the extraction's own title.
    pub title: Option<String>,
    /// The structured extraction produced by the PDF pipeline.
    pub extraction: PaperExtraction,
}

/// A registered paper with counts of its extracted structure.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaperResponse {
    pub paper_id: String,
    pub title: String,
    pub extraction_status: ExtractionStatus,
    pub authors: Vec<String>,
    pub sections: usize,
    pub figures: usize,
    pub tables: usize,
    pub equations: usize,
    pub references: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<models::Paper> for PaperResponse {
    fn from(paper: models::Paper) -> Self {
        let extraction = paper.extraction.unwrap_or_default();
        Self {
            paper_id: paper.id,
            title: paper.title,
            extraction_status: paper.extraction_status,
            authors: extraction.authors.iter().map(|a| a.display()).collect(),
            sections: extraction.sections.len(),
            figures: extraction.figures.len(),
            tables: extraction.tables.len(),
            equations: extraction.equations.len(),
            references: extraction.references.len(),
            created_at: paper.created_at,
            updated_at: paper.updated_at,
        }
    }
}
