use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Categories a [`ContentPriority`] assigns weights to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    Abstract,
    Introduction,
    Methodology,
    Results,
    Conclusion,
    Technical,
    Figures,
    Tables,
    Equations,
    References,
    Experiments,
    Code,
    SpecificReference,
    Contextual,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 14] = [
        ContentCategory::Abstract,
        ContentCategory::Introduction,
        ContentCategory::Methodology,
        ContentCategory::Results,
        ContentCategory::Conclusion,
        ContentCategory::Technical,
        ContentCategory::Figures,
        ContentCategory::Tables,
        ContentCategory::Equations,
        ContentCategory::References,
        ContentCategory::Experiments,
        ContentCategory::Code,
        ContentCategory::SpecificReference,
        ContentCategory::Contextual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Abstract => "abstract",
            Self::Introduction => "introduction",
            Self::Methodology => "methodology",
            Self::Results => "results",
            Self::Conclusion => "conclusion",
            Self::Technical => "technical",
            Self::Figures => "figures",
            Self::Tables => "tables",
            Self::Equations => "equations",
            Self::References => "references",
            Self::Experiments => "experiments",
            Self::Code => "code",
            Self::SpecificReference => "specific_reference",
            Self::Contextual => "contextual",
        }
    }
}

impl std::str::FromStr for ContentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        ContentCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("Unknown content category: {s}"))
    }
}

/// Advisory weights in `[0, 1]` per content category. Unset categories weigh
/// 0.0 and the weights need not sum to one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ContentPriority {
    weights: BTreeMap<ContentCategory, f32>,
}

impl ContentPriority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: ContentCategory, weight: f32) -> Self {
        self.set(category, weight);
        self
    }

    pub fn set(&mut self, category: ContentCategory, weight: f32) {
        self.weights.insert(category, weight.clamp(0.0, 1.0));
    }

    pub fn get(&self, category: ContentCategory) -> f32 {
        self.weights.get(&category).copied().unwrap_or(0.0)
    }

    /// Element-wise `max(self[c], other[c] * factor)`. Can only raise weights.
    pub fn merge_scaled(&mut self, other: &ContentPriority, factor: f32) {
        for (category, weight) in &other.weights {
            let scaled = weight * factor;
            if scaled > self.get(*category) {
                self.set(*category, scaled);
            }
        }
    }
}

/// Category tag carried by each retrieved chunk.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ChunkCategory {
    SelectedText,
    SpecificReference,
    Abstract,
    Introduction,
    Methodology,
    Results,
    Experiments,
    Conclusion,
    Figure,
    Table,
    Equation,
    Reference,
    Authors,
}

impl ChunkCategory {
    pub const ALL: [ChunkCategory; 13] = [
        ChunkCategory::SelectedText,
        ChunkCategory::SpecificReference,
        ChunkCategory::Abstract,
        ChunkCategory::Introduction,
        ChunkCategory::Methodology,
        ChunkCategory::Results,
        ChunkCategory::Experiments,
        ChunkCategory::Conclusion,
        ChunkCategory::Figure,
        ChunkCategory::Table,
        ChunkCategory::Equation,
        ChunkCategory::Reference,
        ChunkCategory::Authors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelectedText => "selected_text",
            Self::SpecificReference => "specific_reference",
            Self::Abstract => "abstract",
            Self::Introduction => "introduction",
            Self::Methodology => "methodology",
            Self::Results => "results",
            Self::Experiments => "experiments",
            Self::Conclusion => "conclusion",
            Self::Figure => "figure",
            Self::Table => "table",
            Self::Equation => "equation",
            Self::Reference => "reference",
            Self::Authors => "authors",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Self::SelectedText => "Selected Text",
            Self::SpecificReference => "Explicitly Referenced Content",
            Self::Abstract => "Abstract",
            Self::Introduction => "Introduction",
            Self::Methodology => "Methodology",
            Self::Results => "Results",
            Self::Experiments => "Experiments",
            Self::Conclusion => "Conclusion",
            Self::Figure => "Figures",
            Self::Table => "Tables",
            Self::Equation => "Equations",
            Self::Reference => "References",
            Self::Authors => "Authors",
        }
    }
}

impl std::fmt::Display for ChunkCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a chunk was rendered from. Used for provenance only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChunkOrigin {
    Selection,
    Abstract,
    Section,
    Figure,
    Table,
    Equation,
    Reference,
    Authors,
    Page,
}

/// A scored, retrievable fragment of paper content.
///
/// Chunks are never mutated after scoring; ranking only filters and reorders
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentChunk {
    content: String,
    source: String,
    category: ChunkCategory,
    origin: ChunkOrigin,
    score: f32,
    page: Option<u32>,
}

impl ContentChunk {
    pub fn new(
        content: impl Into<String>,
        source: impl Into<String>,
        category: ChunkCategory,
        origin: ChunkOrigin,
        score: f32,
        page: Option<u32>,
    ) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            category,
            origin,
            score,
            page,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn category(&self) -> ChunkCategory {
        self.category
    }

    pub fn origin(&self) -> ChunkOrigin {
        self.origin
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn page(&self) -> Option<u32> {
        self.page
    }
}

/// Provenance for a generated answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContextMetadata {
    pub sections_used: Vec<String>,
    pub figures_referenced: Vec<String>,
    pub tables_referenced: Vec<String>,
    pub equations_used: Vec<String>,
    pub pages_referenced: Vec<u32>,
    pub content_sources: Vec<String>,
    pub confidence_score: f32,
}

/// The ordered, deduplicated, budget-capped chunks sent to generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankedContextBundle {
    pub chunks: Vec<ContentChunk>,
    pub max_chunks: usize,
}

impl RankedContextBundle {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn pages_referenced(&self) -> Vec<u32> {
        self.chunks
            .iter()
            .filter_map(ContentChunk::page)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct chunk categories in bundle order.
    pub fn sources_used(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.chunks
            .iter()
            .filter(|c| seen.insert(c.category()))
            .map(|c| c.category().as_str().to_string())
            .collect()
    }

    /// `mean(score) * min(1, len / 5)`; zero when empty.
    pub fn confidence(&self) -> f32 {
        if self.chunks.is_empty() {
            return 0.0;
        }
        let mean = self.chunks.iter().map(ContentChunk::score).sum::<f32>() / self.len() as f32;
        let coverage = (self.len() as f32 / 5.0).min(1.0);
        (mean * coverage).clamp(0.0, 1.0)
    }

    pub fn metadata(&self) -> ContextMetadata {
        let labels = |origin: ChunkOrigin| -> Vec<String> {
            let mut seen = BTreeSet::new();
            self.chunks
                .iter()
                .filter(|c| c.origin() == origin && seen.insert(c.source().to_string()))
                .map(|c| c.source().to_string())
                .collect()
        };

        let mut sections = labels(ChunkOrigin::Section);
        if self.chunks.iter().any(|c| c.origin() == ChunkOrigin::Abstract) {
            sections.insert(0, "Abstract".to_string());
        }

        ContextMetadata {
            sections_used: sections,
            figures_referenced: labels(ChunkOrigin::Figure),
            tables_referenced: labels(ChunkOrigin::Table),
            equations_used: labels(ChunkOrigin::Equation),
            pages_referenced: self.pages_referenced(),
            content_sources: self.sources_used(),
            confidence_score: self.confidence(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(category: ChunkCategory, origin: ChunkOrigin, score: f32, page: Option<u32>) -> ContentChunk {
        ContentChunk::new("body", format!("{category}"), category, origin, score, page)
    }

    #[test]
    fn test_unset_weight_is_zero() {
        let priority = ContentPriority::new().with(ContentCategory::Abstract, 0.8);
        assert_eq!(priority.get(ContentCategory::Abstract), 0.8);
        assert_eq!(priority.get(ContentCategory::Code), 0.0);
    }

    #[test]
    fn test_merge_scaled_only_raises() {
        let mut primary = ContentPriority::new()
            .with(ContentCategory::Results, 0.9)
            .with(ContentCategory::Tables, 0.2);
        let secondary = ContentPriority::new()
            .with(ContentCategory::Results, 1.0)
            .with(ContentCategory::Tables, 0.8)
            .with(ContentCategory::References, 0.6);

        primary.merge_scaled(&secondary, 0.5);

        assert_eq!(primary.get(ContentCategory::Results), 0.9);
        assert_eq!(primary.get(ContentCategory::Tables), 0.4);
        assert_eq!(primary.get(ContentCategory::References), 0.3);
    }

    #[test]
    fn test_category_parses_loosely() {
        let parsed: ContentCategory = "Specific Reference".parse().expect("parse");
        assert_eq!(parsed, ContentCategory::SpecificReference);
        assert!("nonsense".parse::<ContentCategory>().is_err());
    }

    #[test]
    fn test_empty_bundle_has_zero_confidence() {
        assert_eq!(RankedContextBundle::default().confidence(), 0.0);
    }

    #[test]
    fn test_confidence_scales_with_count_and_mean() {
        let bundle = RankedContextBundle {
            chunks: vec![
                chunk(ChunkCategory::Results, ChunkOrigin::Section, 1.0, None),
                chunk(ChunkCategory::Results, ChunkOrigin::Section, 0.5, None),
            ],
            max_chunks: 8,
        };
        assert!((bundle.confidence() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_metadata_collects_provenance() {
        let bundle = RankedContextBundle {
            chunks: vec![
                chunk(ChunkCategory::Abstract, ChunkOrigin::Abstract, 0.9, Some(1)),
                chunk(ChunkCategory::Figure, ChunkOrigin::Figure, 0.7, Some(4)),
                chunk(ChunkCategory::Results, ChunkOrigin::Section, 0.8, Some(4)),
                chunk(ChunkCategory::Table, ChunkOrigin::Table, 0.6, Some(6)),
            ],
            max_chunks: 8,
        };

        let metadata = bundle.metadata();
        assert_eq!(metadata.pages_referenced, vec![1, 4, 6]);
        assert_eq!(metadata.sections_used, vec!["Abstract", "results"]);
        assert_eq!(metadata.figures_referenced, vec!["figure"]);
        assert_eq!(metadata.tables_referenced, vec!["table"]);
        assert_eq!(
            metadata.content_sources,
            vec!["abstract", "figure", "results", "table"]
        );
    }
}
