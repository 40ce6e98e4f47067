use std::collections::HashSet;

use super::text::normalize;
use crate::models::{ChunkCategory, ContentChunk, QueryType, RankedContextBundle};

/// Chunk budget before secondary types widen it.
pub fn base_budget(query_type: QueryType) -> usize {
    match query_type {
        QueryType::Summary => 6,
        QueryType::Methodology | QueryType::TechnicalDetails => 10,
        QueryType::Results => 8,
        QueryType::Comparison => 12,
        QueryType::SpecificReference => 4,
        QueryType::Conceptual | QueryType::General => 8,
    }
}

/// `base + 2 * secondary`, never above `cap`.
pub fn max_chunks(query_type: QueryType, secondary_count: usize, cap: usize) -> usize {
    (base_budget(query_type) + 2 * secondary_count).min(cap)
}

/// Keep the first chunk of every normalized body. Idempotent.
pub fn dedup(chunks: Vec<ContentChunk>) -> Vec<ContentChunk> {
    let mut seen = HashSet::new();
    chunks
        .into_iter()
        .filter(|chunk| seen.insert(normalize(chunk.content())))
        .collect()
}

/// Deduplicates, orders and budgets retrieved chunks.
#[derive(Debug, Clone)]
pub struct Ranker {
    cap: usize,
}

impl Ranker {
    pub fn new(cap: usize) -> Self {
        Self { cap }
    }

    pub fn budget(&self, query_type: QueryType, secondary_count: usize) -> usize {
        max_chunks(query_type, secondary_count, self.cap)
    }

    /// The selected-text chunk leads; everything else follows by descending
    /// score, ties kept in retrieval order. The author chunk is only retrieved
    /// when the question calls for it, so it is never cut by the budget.
    pub fn rank(
        &self,
        chunks: Vec<ContentChunk>,
        query_type: QueryType,
        secondary_count: usize,
    ) -> RankedContextBundle {
        let max_chunks = self.budget(query_type, secondary_count);

        let (mut selected, mut rest): (Vec<_>, Vec<_>) = dedup(chunks)
            .into_iter()
            .partition(|c| c.category() == ChunkCategory::SelectedText);

        rest.sort_by(|a, b| b.score().total_cmp(&a.score()));
        selected.truncate(1);
        selected.extend(rest);
        truncate_reserved(&mut selected, max_chunks);

        RankedContextBundle {
            chunks: selected,
            max_chunks,
        }
    }
}

/// Trim to `max` by dropping the lowest-ranked chunks that are neither the
/// selection nor the authors.
fn truncate_reserved(chunks: &mut Vec<ContentChunk>, max: usize) {
    while chunks.len() > max {
        let droppable = chunks.iter().rposition(|c| {
            !matches!(
                c.category(),
                ChunkCategory::SelectedText | ChunkCategory::Authors
            )
        });
        match droppable {
            Some(index) => {
                chunks.remove(index);
            }
            None => chunks.truncate(max),
        }
    }
}
