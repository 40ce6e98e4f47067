use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Closed taxonomy of user intent. Drives both retrieval weighting and
/// generation parameters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    Summary,
    Methodology,
    Results,
    TechnicalDetails,
    Comparison,
    SpecificReference,
    Conceptual,
    General,
}

impl QueryType {
    /// Classification order: the first matching type becomes the primary.
    pub const ORDERED: [QueryType; 7] = [
        QueryType::Summary,
        QueryType::Methodology,
        QueryType::Results,
        QueryType::TechnicalDetails,
        QueryType::Comparison,
        QueryType::SpecificReference,
        QueryType::Conceptual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "SUMMARY",
            Self::Methodology => "METHODOLOGY",
            Self::Results => "RESULTS",
            Self::TechnicalDetails => "TECHNICAL_DETAILS",
            Self::Comparison => "COMPARISON",
            Self::SpecificReference => "SPECIFIC_REFERENCE",
            Self::Conceptual => "CONCEPTUAL",
            Self::General => "GENERAL",
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QueryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SUMMARY" => Ok(Self::Summary),
            "METHODOLOGY" => Ok(Self::Methodology),
            "RESULTS" => Ok(Self::Results),
            "TECHNICAL_DETAILS" => Ok(Self::TechnicalDetails),
            "COMPARISON" => Ok(Self::Comparison),
            "SPECIFIC_REFERENCE" => Ok(Self::SpecificReference),
            "CONCEPTUAL" => Ok(Self::Conceptual),
            "GENERAL" => Ok(Self::General),
            _ => Err(format!("Unknown query type: {s}")),
        }
    }
}

/// Explicit structural pointers found in the query text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpecificReferences {
    pub figures: BTreeSet<u32>,
    pub tables: BTreeSet<u32>,
    pub equations: BTreeSet<u32>,
    pub pages: BTreeSet<u32>,
    /// Section keywords such as `introduction` or `results`.
    pub sections: BTreeSet<String>,
}

impl SpecificReferences {
    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
            && self.tables.is_empty()
            && self.equations.is_empty()
            && self.pages.is_empty()
            && self.sections.is_empty()
    }

    /// Human-readable listing, e.g. `figures [3]; pages [7]`.
    pub fn describe(&self) -> String {
        fn join(values: &BTreeSet<u32>) -> String {
            values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }

        let mut parts = Vec::new();
        if !self.figures.is_empty() {
            parts.push(format!("figures [{}]", join(&self.figures)));
        }
        if !self.tables.is_empty() {
            parts.push(format!("tables [{}]", join(&self.tables)));
        }
        if !self.equations.is_empty() {
            parts.push(format!("equations [{}]", join(&self.equations)));
        }
        if !self.pages.is_empty() {
            parts.push(format!("pages [{}]", join(&self.pages)));
        }
        if !self.sections.is_empty() {
            let sections: Vec<&str> = self.sections.iter().map(String::as_str).collect();
            parts.push(format!("sections [{}]", sections.join(", ")));
        }

        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join("; ")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    StructuredSummary,
    StepByStep,
    DataFocused,
    TechnicalDeepDive,
    ComparativeAnalysis,
    ReferenceFocused,
    Explanatory,
    Conversational,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContextualDepth {
    Shallow,
    Moderate,
    Deep,
}

impl ContextualDepth {
    pub fn from_complexity(complexity: f32) -> Self {
        if complexity < 0.3 {
            Self::Shallow
        } else if complexity < 0.7 {
            Self::Moderate
        } else {
            Self::Deep
        }
    }
}

/// Generation parameters and response-shaping flags for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptStrategy {
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
    pub response_format: ResponseFormat,
    pub use_structured_format: bool,
    pub include_citations: bool,
    pub emphasize_accuracy: bool,
    pub contextual_depth: ContextualDepth,
    /// Target answer length in words, inclusive.
    #[schema(value_type = Vec<u32>)]
    pub word_range: (u32, u32),
}

/// Immutable result of classifying one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryAnalysis {
    pub query: String,
    pub primary_type: QueryType,
    /// Every type whose patterns matched, the primary included.
    pub matched_types: BTreeSet<QueryType>,
    pub references: SpecificReferences,
    pub complexity: f32,
    pub include_references: bool,
    pub include_authors: bool,
    pub has_selection: bool,
    pub strategy: PromptStrategy,
}

impl QueryAnalysis {
    /// Matched types other than the primary, in classification order.
    pub fn secondary_types(&self) -> Vec<QueryType> {
        self.matched_types
            .iter()
            .copied()
            .filter(|t| *t != self.primary_type)
            .collect()
    }
}
