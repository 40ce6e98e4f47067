use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only structured extraction of a paper, produced by an external
/// extraction pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaperExtraction {
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub figures: Vec<Figure>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub equations: Vec<Equation>,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub authors: Vec<Author>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    /// Declared type tag such as `introduction`, `methodology` or `results`.
    #[serde(default)]
    pub section_type: String,
    pub page_start: Option<u32>,
    pub page_end: Option<u32>,
    #[serde(default)]
    pub paragraphs: Vec<String>,
}

impl Section {
    /// Paragraphs joined in original order. A section without paragraphs is
    /// represented by its title.
    pub fn text(&self) -> String {
        let paragraphs: Vec<&str> = self
            .paragraphs
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();

        if paragraphs.is_empty() {
            self.title.clone()
        } else {
            paragraphs.join("\n\n")
        }
    }

    /// True when the declared type tag contains `tag` (case-insensitive).
    pub fn has_type(&self, tag: &str) -> bool {
        self.section_type.to_lowercase().contains(tag)
    }

    /// True when the declared type tag or the title contains any keyword.
    pub fn mentions_any(&self, keywords: &[&str]) -> bool {
        let section_type = self.section_type.to_lowercase();
        let title = self.title.to_lowercase();
        keywords
            .iter()
            .any(|k| section_type.contains(k) || title.contains(k))
    }

    pub fn covers_page(&self, page: u32) -> bool {
        match (self.page_start, self.page_end) {
            (Some(start), Some(end)) => (start..=end).contains(&page),
            (Some(start), None) => start == page,
            (None, Some(end)) => end == page,
            (None, None) => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Figure {
    pub label: String,
    #[serde(default)]
    pub caption: String,
    pub page: Option<u32>,
    pub ocr_text: Option<String>,
}

impl Figure {
    pub fn number(&self) -> Option<u32> {
        label_number(&self.label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub label: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    pub page: Option<u32>,
}

impl Table {
    pub fn number(&self) -> Option<u32> {
        label_number(&self.label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Equation {
    pub label: String,
    pub latex: String,
    pub page: Option<u32>,
}

impl Equation {
    pub fn number(&self) -> Option<u32> {
        label_number(&self.label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    pub venue: Option<String>,
    pub year: Option<i32>,
    pub url: Option<String>,
    pub doi: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    pub affiliation: Option<String>,
    pub email: Option<String>,
}

impl Author {
    /// `name (affiliation)`, or just the name when the affiliation is unknown.
    pub fn display(&self) -> String {
        match self
            .affiliation
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
        {
            Some(affiliation) => format!("{} ({})", self.name, affiliation),
            None => self.name.clone(),
        }
    }
}

/// First run of ASCII digits in a label such as `Figure 3` or `Tab. 12a`.
pub fn label_number(label: &str) -> Option<u32> {
    let digits: String = label
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for ExtractionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown extraction status: {s}")),
        }
    }
}

/// A paper as known to the chat store, with its extraction if one exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    pub id: String,
    pub title: String,
    pub extraction_status: ExtractionStatus,
    pub extraction: Option<PaperExtraction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Paper {
    pub fn new(id: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            extraction_status: ExtractionStatus::Pending,
            extraction: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The extraction, but only when extraction has completed.
    pub fn completed_extraction(&self) -> Option<&PaperExtraction> {
        match self.extraction_status {
            ExtractionStatus::Completed => self.extraction.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_text_joins_paragraphs_in_order() {
        let section = Section {
            title: "Method".into(),
            paragraphs: vec!["First.".into(), "  ".into(), "Second.".into()],
            ..Default::default()
        };
        assert_eq!(section.text(), "First.\n\nSecond.");
    }

    #[test]
    fn test_empty_section_falls_back_to_title() {
        let section = Section {
            title: "Acknowledgements".into(),
            ..Default::default()
        };
        assert_eq!(section.text(), "Acknowledgements");
    }

    #[test]
    fn test_label_numbers() {
        assert_eq!(label_number("Figure 3"), Some(3));
        assert_eq!(label_number("Tab. 12a"), Some(12));
        assert_eq!(label_number("Eq.(7)"), Some(7));
        assert_eq!(label_number("Appendix"), None);
        assert_eq!(label_number("Figure 99999999999"), None);
    }

    #[test]
    fn test_page_coverage() {
        let section = Section {
            page_start: Some(3),
            page_end: Some(5),
            ..Default::default()
        };
        assert!(section.covers_page(4));
        assert!(!section.covers_page(6));
    }

    #[test]
    fn test_completed_extraction_requires_completed_status() {
        let mut paper = Paper::new("p1".into(), "A Paper".into());
        paper.extraction = Some(PaperExtraction::default());
        assert!(paper.completed_extraction().is_none());

        paper.extraction_status = ExtractionStatus::Completed;
        assert!(paper.completed_extraction().is_some());
    }

    #[test]
    fn test_extraction_deserializes_abstract_field() {
        let json = r#"{"title":"T","abstract":"We study things.","authors":[{"name":"Ada"}]}"#;
        let extraction: PaperExtraction = serde_json::from_str(json).expect("deserialize");
        assert_eq!(extraction.abstract_text, "We study things.");
        assert_eq!(extraction.authors[0].display(), "Ada");
        assert!(extraction.sections.is_empty());
    }
}
