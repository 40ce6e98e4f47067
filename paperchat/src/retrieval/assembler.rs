use std::fmt::Write as _;

use super::text::preview;
use super::Selection;
use crate::llm::prompts::{format_instruction, BASE_PERSONA};
use crate::models::{
    ChatMessage, ChunkCategory, ContentChunk, MessageRole, PaperExtraction, QueryAnalysis,
    QueryType, RankedContextBundle,
};

/// Preferred category order when rendering chunks for a query type.
/// Categories not listed follow in their natural order.
pub fn category_order(query_type: QueryType) -> Vec<ChunkCategory> {
    use ChunkCategory::*;

    let preferred: &[ChunkCategory] = match query_type {
        QueryType::Summary => &[Abstract, Introduction, Conclusion, Results, Methodology, Authors],
        QueryType::Methodology => &[Methodology, Experiments, Equation, Figure, Introduction],
        QueryType::Results => &[Results, Figure, Table, Experiments, Conclusion],
        QueryType::TechnicalDetails => &[Methodology, Equation, Figure, Table, Experiments],
        QueryType::Comparison => &[Results, Table, Experiments, Reference, Figure, Conclusion],
        QueryType::SpecificReference => &[Figure, Table, Equation],
        QueryType::Conceptual => &[Introduction, Abstract, Methodology, Conclusion],
        QueryType::General => &[],
    };

    let mut order = vec![SelectedText, SpecificReference];
    order.extend(preferred.iter().copied());
    for category in ChunkCategory::ALL {
        if !order.contains(&category) {
            order.push(category);
        }
    }
    order
}

/// Renders the single prompt string sent to the generation service.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    history_turns: usize,
    abstract_preview_chars: usize,
}

impl PromptAssembler {
    pub fn new(history_turns: usize, abstract_preview_chars: usize) -> Self {
        Self {
            history_turns,
            abstract_preview_chars,
        }
    }

    pub fn assemble(
        &self,
        extraction: &PaperExtraction,
        analysis: &QueryAnalysis,
        bundle: &RankedContextBundle,
        history: &[ChatMessage],
        selection: Option<&Selection<'_>>,
    ) -> String {
        let mut prompt = String::new();

        self.system_block(&mut prompt, analysis);
        self.metadata_block(&mut prompt, extraction, analysis);
        self.content_block(&mut prompt, analysis, bundle);
        self.history_block(&mut prompt, history);
        if let Some(selection) = selection {
            self.selection_block(&mut prompt, selection);
        }
        self.question_block(&mut prompt, analysis);
        self.format_block(&mut prompt, analysis);

        prompt
    }

    fn system_block(&self, out: &mut String, analysis: &QueryAnalysis) {
        let _ = writeln!(out, "{BASE_PERSONA}");
        let _ = writeln!(out, "{}", analysis.strategy.system_prompt);
        out.push('\n');
    }

    fn metadata_block(&self, out: &mut String, extraction: &PaperExtraction, analysis: &QueryAnalysis) {
        let _ = writeln!(out, "## Paper");
        let _ = writeln!(out, "Title: {}", extraction.title.trim());

        if analysis.include_authors && !extraction.authors.is_empty() {
            let authors: Vec<String> = extraction.authors.iter().map(|a| a.display()).collect();
            let _ = writeln!(out, "Authors: {}", authors.join(", "));
        }

        if !extraction.abstract_text.trim().is_empty() {
            let _ = writeln!(
                out,
                "Abstract: {}",
                preview(extraction.abstract_text.trim(), self.abstract_preview_chars)
            );
        }

        let _ = writeln!(
            out,
            "Structure: {} sections, {} figures, {} tables, {} equations, {} references",
            extraction.sections.len(),
            extraction.figures.len(),
            extraction.tables.len(),
            extraction.equations.len(),
            extraction.references.len()
        );
        out.push('\n');
    }

    fn content_block(&self, out: &mut String, analysis: &QueryAnalysis, bundle: &RankedContextBundle) {
        let _ = writeln!(out, "## Relevant Content");

        if bundle.is_empty() {
            let _ = writeln!(out, "No relevant content was found in the paper for this question.");
            out.push('\n');
            return;
        }

        for category in category_order(analysis.primary_type) {
            let chunks: Vec<&ContentChunk> = bundle
                .chunks
                .iter()
                .filter(|c| c.category() == category)
                .collect();
            if chunks.is_empty() {
                continue;
            }

            let _ = writeln!(out, "### {}", category.heading());
            for chunk in chunks {
                match chunk.page() {
                    Some(page) => {
                        let _ = writeln!(out, "[{}, page {}]", chunk.source(), page);
                    }
                    None => {
                        let _ = writeln!(out, "[{}]", chunk.source());
                    }
                }
                let _ = writeln!(out, "{}", chunk.content());
                out.push('\n');
            }
        }
    }

    fn history_block(&self, out: &mut String, history: &[ChatMessage]) {
        let keep = self.history_turns * 2;
        if keep == 0 || history.is_empty() {
            return;
        }

        let recent = &history[history.len().saturating_sub(keep)..];
        let _ = writeln!(out, "## Conversation So Far");
        for message in recent {
            let speaker = match message.role {
                MessageRole::User => "User",
                MessageRole::Assistant => "Assistant",
            };
            let _ = writeln!(out, "{speaker}: {}", message.content.trim());
        }
        out.push('\n');
    }

    fn selection_block(&self, out: &mut String, selection: &Selection<'_>) {
        let _ = writeln!(out, "## Selected Text");
        let _ = writeln!(
            out,
            "The user highlighted this passage. Prioritize it when answering:"
        );
        let _ = writeln!(out, "\"\"\"\n{}\n\"\"\"", selection.text);
        out.push('\n');
    }

    fn question_block(&self, out: &mut String, analysis: &QueryAnalysis) {
        let secondary: Vec<&str> = analysis
            .secondary_types()
            .iter()
            .map(QueryType::as_str)
            .collect();

        let _ = writeln!(out, "## Question");
        let _ = writeln!(out, "{}", analysis.query.trim());
        let _ = writeln!(out, "Query type: {}", analysis.primary_type);
        let _ = writeln!(out, "Complexity: {:.2}", analysis.complexity);
        if !secondary.is_empty() {
            let _ = writeln!(out, "Secondary types: {}", secondary.join(", "));
        }
        if !analysis.references.is_empty() {
            let _ = writeln!(
                out,
                "Specific references: {}",
                analysis.references.describe()
            );
        }
        out.push('\n');
    }

    fn format_block(&self, out: &mut String, analysis: &QueryAnalysis) {
        let strategy = &analysis.strategy;
        let _ = writeln!(out, "## Response Guidelines");
        let _ = writeln!(out, "- {}", format_instruction(strategy.response_format));
        if strategy.use_structured_format {
            let _ = writeln!(out, "- Use clear headings or bullet points.");
        }
        if strategy.include_citations {
            let _ = writeln!(
                out,
                "- Cite the sections, figures, tables or pages you rely on, e.g. (Section 3) or (Table 2)."
            );
        }
        if strategy.emphasize_accuracy {
            let _ = writeln!(
                out,
                "- Report values exactly as they appear in the paper. Do not estimate or invent numbers."
            );
        }
        let (min_words, max_words) = strategy.word_range;
        let _ = write!(out, "- Aim for {min_words}-{max_words} words.");
    }
}
