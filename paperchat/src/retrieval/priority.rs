use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{ContentCategory, ContentPriority, QueryAnalysis, QueryType};

/// Factor applied to each secondary type's weights before merging.
pub const SECONDARY_FACTOR: f32 = 0.5;

/// Supplies the content weights used to retrieve and score chunks for a
/// classified query.
pub trait PrioritySource: Send + Sync {
    fn priority_for(&self, analysis: &QueryAnalysis) -> ContentPriority;

    /// Adjust classifier flags the source has an opinion on.
    fn refine(&self, _analysis: &mut QueryAnalysis) {}
}

/// Fixed weight vectors per query type, blended across matched types.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPriorityTable;

impl StaticPriorityTable {
    pub fn base(query_type: QueryType) -> ContentPriority {
        use ContentCategory::*;

        let weights: &[(ContentCategory, f32)] = match query_type {
            QueryType::Summary => &[
                (Abstract, 1.0),
                (Introduction, 0.8),
                (Conclusion, 0.9),
                (Results, 0.6),
                (Methodology, 0.4),
                (Figures, 0.3),
                (Tables, 0.3),
                (References, 0.1),
                (Contextual, 0.5),
            ],
            QueryType::Methodology => &[
                (Methodology, 1.0),
                (Technical, 0.9),
                (Experiments, 0.8),
                (Equations, 0.7),
                (Figures, 0.6),
                (Code, 0.6),
                (Introduction, 0.4),
                (Abstract, 0.3),
                (Results, 0.3),
            ],
            QueryType::Results => &[
                (Results, 1.0),
                (Experiments, 0.9),
                (Figures, 0.9),
                (Tables, 0.9),
                (Conclusion, 0.7),
                (Abstract, 0.4),
                (Methodology, 0.3),
            ],
            QueryType::TechnicalDetails => &[
                (Technical, 1.0),
                (Methodology, 0.9),
                (Equations, 0.9),
                (Code, 0.8),
                (Figures, 0.6),
                (Tables, 0.5),
                (Experiments, 0.5),
            ],
            QueryType::Comparison => &[
                (Results, 0.9),
                (References, 0.9),
                (Tables, 0.8),
                (Experiments, 0.8),
                (Figures, 0.6),
                (Conclusion, 0.6),
                (Methodology, 0.5),
                (Introduction, 0.5),
                (Abstract, 0.4),
            ],
            QueryType::SpecificReference => &[
                (SpecificReference, 1.0),
                (Figures, 0.8),
                (Tables, 0.8),
                (Equations, 0.7),
                (Contextual, 0.6),
            ],
            QueryType::Conceptual => &[
                (Introduction, 0.9),
                (Abstract, 0.8),
                (Methodology, 0.7),
                (Technical, 0.5),
                (Conclusion, 0.5),
                (Contextual, 0.7),
                (Figures, 0.3),
            ],
            QueryType::General => &[
                (Abstract, 0.7),
                (Introduction, 0.6),
                (Conclusion, 0.6),
                (Methodology, 0.5),
                (Results, 0.5),
                (Figures, 0.3),
                (Tables, 0.3),
                (Contextual, 0.5),
            ],
        };

        weights
            .iter()
            .fold(ContentPriority::new(), |priority, (c, w)| priority.with(*c, *w))
    }
}

impl PrioritySource for StaticPriorityTable {
    fn priority_for(&self, analysis: &QueryAnalysis) -> ContentPriority {
        let mut priority = Self::base(analysis.primary_type);
        for secondary in analysis.secondary_types() {
            priority.merge_scaled(&Self::base(secondary), SECONDARY_FACTOR);
        }
        priority
    }
}

/// Per-query content needs reported by the language model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentRequirements {
    #[serde(default)]
    pub weights: BTreeMap<String, f32>,
    #[serde(default)]
    pub include_references: bool,
    #[serde(default)]
    pub include_authors: bool,
}

impl ContentRequirements {
    /// Known categories with their clamped weights. Unknown names are dropped.
    pub fn category_weights(&self) -> Vec<(ContentCategory, f32)> {
        self.weights
            .iter()
            .filter_map(|(name, weight)| {
                let category = name.parse::<ContentCategory>().ok()?;
                weight
                    .is_finite()
                    .then(|| (category, weight.clamp(0.0, 1.0)))
            })
            .collect()
    }
}

/// The static table raised by model-reported requirements. Requirements can
/// only add weight and switch flags on, never take them away.
#[derive(Debug, Clone)]
pub struct RequirementsPriority {
    base: StaticPriorityTable,
    requirements: ContentRequirements,
}

impl RequirementsPriority {
    pub fn new(requirements: ContentRequirements) -> Self {
        Self {
            base: StaticPriorityTable,
            requirements,
        }
    }
}

impl PrioritySource for RequirementsPriority {
    fn priority_for(&self, analysis: &QueryAnalysis) -> ContentPriority {
        let mut priority = self.base.priority_for(analysis);
        for (category, weight) in self.requirements.category_weights() {
            if weight > priority.get(category) {
                priority.set(category, weight);
            }
        }
        priority
    }

    fn refine(&self, analysis: &mut QueryAnalysis) {
        analysis.include_references |= self.requirements.include_references;
        analysis.include_authors |= self.requirements.include_authors;
    }
}

/// Requirement-raised weights when the model reported requirements, the
/// static table otherwise.
pub fn priority_source(requirements: Option<ContentRequirements>) -> Box<dyn PrioritySource> {
    match requirements {
        Some(requirements) => Box::new(RequirementsPriority::new(requirements)),
        None => Box::new(StaticPriorityTable),
    }
}
