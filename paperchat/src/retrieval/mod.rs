//! Query-aware retrieval over a structured paper extraction.
//!
//! One parameterized pipeline: classify, weight, retrieve and score, rank,
//! then assemble the prompt. The weighting step is pluggable through
//! [`PrioritySource`]; everything else is a pure function of its inputs.

mod assembler;
mod cache;
mod classifier;
mod priority;
mod ranker;
mod retriever;
mod scorer;
pub mod text;

pub use assembler::{category_order, PromptAssembler};
pub use cache::RequirementsCache;
pub use classifier::{
    asks_about_title, complexity, extract_references, prompt_strategy, QueryClassifier,
};
pub use priority::{
    priority_source, ContentRequirements, PrioritySource, RequirementsPriority,
    StaticPriorityTable, SECONDARY_FACTOR,
};
pub use ranker::{base_budget, dedup, max_chunks, Ranker};
pub use retriever::{category_weight, section_category, ContentRetriever};
pub use scorer::RelevanceScorer;

use crate::config::RetrievalConfig;
use crate::models::{ChatMessage, ContentPriority, PaperExtraction, QueryAnalysis, RankedContextBundle};

/// Text the user highlighted, with the page it came from when known.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub text: &'a str,
    pub page: Option<u32>,
}

impl<'a> Selection<'a> {
    /// `None` when the text is empty or whitespace only.
    pub fn new(text: Option<&'a str>, page: Option<u32>) -> Option<Self> {
        text.map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|text| Self { text, page })
    }
}

/// Output of retrieval and ranking for one query.
#[derive(Debug, Clone)]
pub struct PreparedContext {
    pub analysis: QueryAnalysis,
    pub priority: ContentPriority,
    pub bundle: RankedContextBundle,
}

pub struct RetrievalPipeline {
    classifier: QueryClassifier,
    retriever: ContentRetriever,
    ranker: Ranker,
    assembler: PromptAssembler,
}

impl RetrievalPipeline {
    pub fn new(config: &RetrievalConfig, history_turns: usize) -> Self {
        Self {
            classifier: QueryClassifier::new(),
            retriever: ContentRetriever::new(config.clone()),
            ranker: Ranker::new(config.max_chunks_cap),
            assembler: PromptAssembler::new(history_turns, config.abstract_preview_chars),
        }
    }

    pub fn classify(&self, query: &str, selection: Option<&Selection<'_>>) -> QueryAnalysis {
        self.classifier.classify(query, selection.is_some())
    }

    /// Weight, retrieve, score and rank content for an analyzed query.
    pub fn prepare(
        &self,
        extraction: &PaperExtraction,
        mut analysis: QueryAnalysis,
        selection: Option<&Selection<'_>>,
        source: &dyn PrioritySource,
    ) -> PreparedContext {
        source.refine(&mut analysis);
        let priority = source.priority_for(&analysis);

        let chunks = self
            .retriever
            .retrieve(extraction, &analysis, &priority, selection);
        let retrieved = chunks.len();

        let bundle = self.ranker.rank(
            chunks,
            analysis.primary_type,
            analysis.secondary_types().len(),
        );

        tracing::debug!(
            query_type = %analysis.primary_type,
            retrieved,
            chunks = bundle.len(),
            max_chunks = bundle.max_chunks,
            "Ranked paper content"
        );

        PreparedContext {
            analysis,
            priority,
            bundle,
        }
    }

    pub fn build_prompt(
        &self,
        extraction: &PaperExtraction,
        context: &PreparedContext,
        history: &[ChatMessage],
        selection: Option<&Selection<'_>>,
    ) -> String {
        self.assembler.assemble(
            extraction,
            &context.analysis,
            &context.bundle,
            history,
            selection,
        )
    }
}
