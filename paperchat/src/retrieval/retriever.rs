//! Walks a paper extraction and emits scored candidate chunks.
//!
//! Emission order is fixed: selection, explicit references, abstract,
//! introduction, methodology, results and experiments, conclusion, figures,
//! tables, equations, references, authors. Ranking relies on it to keep the
//! forced copy of any duplicated artifact.

use super::scorer::RelevanceScorer;
use super::text::truncate_chars;
use super::Selection;
use crate::config::RetrievalConfig;
use crate::models::{
    ChunkCategory, ChunkOrigin, ContentCategory, ContentChunk, ContentPriority, Equation, Figure,
    PaperExtraction, QueryAnalysis, QueryType, Reference, Section, Table,
};

const METHOD_KEYWORDS: &[&str] = &["method", "approach", "algorithm", "framework", "architecture"];
const MATH_KEYWORDS: &[&str] = &["equation", "formula", "math", "calculation"];

/// Floor for the author chunk weight; authors are rarely the answer but
/// never noise when asked for.
const AUTHOR_WEIGHT_FLOOR: f32 = 0.5;
const FORCED_SCORE: f32 = 1.0;

/// Which body category a section belongs to, if any.
pub fn section_category(section: &Section) -> Option<ChunkCategory> {
    if section.has_type("abstract") {
        return Some(ChunkCategory::Abstract);
    }
    if section.has_type("intro") {
        return Some(ChunkCategory::Introduction);
    }
    if section.has_type("conclu") || section.has_type("discussion") {
        return Some(ChunkCategory::Conclusion);
    }
    if section.has_type("result") {
        return Some(ChunkCategory::Results);
    }
    if section.has_type("experiment") || section.has_type("evaluation") {
        return Some(ChunkCategory::Experiments);
    }
    if section.mentions_any(METHOD_KEYWORDS) {
        return Some(ChunkCategory::Methodology);
    }

    let title = section.title.to_lowercase();
    if title.contains("introduction") {
        Some(ChunkCategory::Introduction)
    } else if title.contains("result") {
        Some(ChunkCategory::Results)
    } else if title.contains("experiment") || title.contains("evaluation") {
        Some(ChunkCategory::Experiments)
    } else if title.contains("conclusion") || title.contains("discussion") {
        Some(ChunkCategory::Conclusion)
    } else {
        None
    }
}

/// Section keyword a query may name for each body category.
fn section_keyword(category: ChunkCategory) -> &'static str {
    match category {
        ChunkCategory::Abstract => "abstract",
        ChunkCategory::Introduction => "introduction",
        ChunkCategory::Methodology => "methodology",
        ChunkCategory::Results | ChunkCategory::Experiments => "results",
        ChunkCategory::Conclusion => "conclusion",
        _ => "",
    }
}

/// Priority weight applied to chunks of a category.
pub fn category_weight(priority: &ContentPriority, category: ChunkCategory) -> f32 {
    match category {
        ChunkCategory::SelectedText => FORCED_SCORE,
        ChunkCategory::SpecificReference => priority.get(ContentCategory::SpecificReference),
        ChunkCategory::Abstract => priority.get(ContentCategory::Abstract),
        ChunkCategory::Introduction => priority.get(ContentCategory::Introduction),
        ChunkCategory::Methodology => priority
            .get(ContentCategory::Methodology)
            .max(priority.get(ContentCategory::Technical)),
        ChunkCategory::Results => priority.get(ContentCategory::Results),
        ChunkCategory::Experiments => priority.get(ContentCategory::Experiments),
        ChunkCategory::Conclusion => priority.get(ContentCategory::Conclusion),
        ChunkCategory::Figure => priority.get(ContentCategory::Figures),
        ChunkCategory::Table => priority.get(ContentCategory::Tables),
        ChunkCategory::Equation => priority.get(ContentCategory::Equations),
        ChunkCategory::Reference => priority.get(ContentCategory::References),
        ChunkCategory::Authors => priority
            .get(ContentCategory::Contextual)
            .max(AUTHOR_WEIGHT_FLOOR),
    }
}

/// Rendered artifact body before scoring.
struct Rendered {
    content: String,
    source: String,
    origin: ChunkOrigin,
    page: Option<u32>,
}

pub struct ContentRetriever {
    config: RetrievalConfig,
}

impl ContentRetriever {
    pub fn new(config: RetrievalConfig) -> Self {
        Self { config }
    }

    pub fn retrieve(
        &self,
        extraction: &PaperExtraction,
        analysis: &QueryAnalysis,
        priority: &ContentPriority,
        selection: Option<&Selection<'_>>,
    ) -> Vec<ContentChunk> {
        let scorer = RelevanceScorer::new(&analysis.query, selection.map(|s| s.text));
        let mut chunks = Vec::new();

        if let Some(selection) = selection {
            chunks.push(ContentChunk::new(
                self.cap(selection.text),
                "Selected text",
                ChunkCategory::SelectedText,
                ChunkOrigin::Selection,
                FORCED_SCORE,
                selection.page,
            ));
        }

        self.push_specific_references(extraction, analysis, &mut chunks);
        self.push_sections(extraction, analysis, priority, &scorer, &mut chunks);
        self.push_artifacts(extraction, analysis, priority, &scorer, &mut chunks);
        self.push_authors(extraction, analysis, priority, &scorer, &mut chunks);

        chunks
    }

    fn cap(&self, text: &str) -> String {
        truncate_chars(text, self.config.max_chunk_chars).to_string()
    }

    fn scored(
        &self,
        rendered: Rendered,
        category: ChunkCategory,
        weight: f32,
        scorer: &RelevanceScorer,
    ) -> ContentChunk {
        let score = scorer.score(&rendered.content, weight);
        ContentChunk::new(
            rendered.content,
            rendered.source,
            category,
            rendered.origin,
            score,
            rendered.page,
        )
    }

    fn forced(&self, rendered: Rendered) -> ContentChunk {
        ContentChunk::new(
            rendered.content,
            rendered.source,
            ChunkCategory::SpecificReference,
            rendered.origin,
            FORCED_SCORE,
            rendered.page,
        )
    }

    fn push_specific_references(
        &self,
        extraction: &PaperExtraction,
        analysis: &QueryAnalysis,
        chunks: &mut Vec<ContentChunk>,
    ) {
        let refs = &analysis.references;

        for number in &refs.figures {
            match extraction.figures.iter().find(|f| f.number() == Some(*number)) {
                Some(figure) => chunks.push(self.forced(self.render_figure(figure))),
                None => tracing::debug!(figure = number, "Referenced figure not in extraction"),
            }
        }
        for number in &refs.tables {
            match extraction.tables.iter().find(|t| t.number() == Some(*number)) {
                Some(table) => chunks.push(self.forced(self.render_table(table))),
                None => tracing::debug!(table = number, "Referenced table not in extraction"),
            }
        }
        for number in &refs.equations {
            match extraction.equations.iter().find(|e| e.number() == Some(*number)) {
                Some(equation) => chunks.push(self.forced(self.render_equation(equation))),
                None => tracing::debug!(equation = number, "Referenced equation not in extraction"),
            }
        }
        for page in &refs.pages {
            match self.render_page(extraction, *page) {
                Some(rendered) => chunks.push(self.forced(rendered)),
                None => tracing::debug!(page, "No section covers referenced page"),
            }
        }
    }

    fn push_sections(
        &self,
        extraction: &PaperExtraction,
        analysis: &QueryAnalysis,
        priority: &ContentPriority,
        scorer: &RelevanceScorer,
        chunks: &mut Vec<ContentChunk>,
    ) {
        let threshold = self.config.section_threshold;
        let named = |category: ChunkCategory| {
            analysis
                .references
                .sections
                .contains(section_keyword(category))
        };

        let abstract_weight = category_weight(priority, ChunkCategory::Abstract);
        if !extraction.abstract_text.trim().is_empty()
            && (abstract_weight > threshold || named(ChunkCategory::Abstract))
        {
            let rendered = Rendered {
                content: self.cap(extraction.abstract_text.trim()),
                source: "Abstract".to_string(),
                origin: ChunkOrigin::Abstract,
                page: None,
            };
            chunks.push(self.scored(rendered, ChunkCategory::Abstract, abstract_weight, scorer));
        }

        let classified: Vec<(ChunkCategory, &Section)> = extraction
            .sections
            .iter()
            .filter_map(|s| section_category(s).map(|c| (c, s)))
            .collect();

        let groups: [&[ChunkCategory]; 4] = [
            &[ChunkCategory::Abstract, ChunkCategory::Introduction],
            &[ChunkCategory::Methodology],
            &[ChunkCategory::Results, ChunkCategory::Experiments],
            &[ChunkCategory::Conclusion],
        ];

        for group in groups {
            for (category, section) in classified.iter().filter(|(c, _)| group.contains(c)) {
                let weight = category_weight(priority, *category);
                let emit = if *category == ChunkCategory::Conclusion {
                    weight > 0.0
                } else {
                    weight > threshold
                };
                if emit || named(*category) {
                    chunks.push(self.scored(self.render_section(section), *category, weight, scorer));
                }
            }
        }
    }

    fn push_artifacts(
        &self,
        extraction: &PaperExtraction,
        analysis: &QueryAnalysis,
        priority: &ContentPriority,
        scorer: &RelevanceScorer,
        chunks: &mut Vec<ContentChunk>,
    ) {
        let threshold = self.config.artifact_threshold;

        let figure_weight = category_weight(priority, ChunkCategory::Figure);
        if figure_weight > threshold {
            for figure in &extraction.figures {
                chunks.push(self.scored(self.render_figure(figure), ChunkCategory::Figure, figure_weight, scorer));
            }
        }

        let table_weight = category_weight(priority, ChunkCategory::Table);
        if table_weight > threshold {
            for table in &extraction.tables {
                chunks.push(self.scored(self.render_table(table), ChunkCategory::Table, table_weight, scorer));
            }
        }

        let equation_weight = category_weight(priority, ChunkCategory::Equation);
        let lowered = analysis.query.to_lowercase();
        let mathy = MATH_KEYWORDS.iter().any(|k| lowered.contains(k));
        if equation_weight > threshold || mathy {
            for equation in &extraction.equations {
                chunks.push(self.scored(
                    self.render_equation(equation),
                    ChunkCategory::Equation,
                    equation_weight,
                    scorer,
                ));
            }
        }

        let reference_weight = category_weight(priority, ChunkCategory::Reference);
        if reference_weight > threshold && analysis.include_references {
            for reference in extraction.references.iter().take(self.config.max_references) {
                chunks.push(self.scored(
                    self.render_reference(reference),
                    ChunkCategory::Reference,
                    reference_weight,
                    scorer,
                ));
            }
        }
    }

    fn push_authors(
        &self,
        extraction: &PaperExtraction,
        analysis: &QueryAnalysis,
        priority: &ContentPriority,
        scorer: &RelevanceScorer,
        chunks: &mut Vec<ContentChunk>,
    ) {
        let requested = analysis.include_authors || analysis.primary_type == QueryType::Summary;
        if !requested || extraction.authors.is_empty() {
            return;
        }

        let names: Vec<String> = extraction.authors.iter().map(|a| a.display()).collect();
        let rendered = Rendered {
            content: self.cap(&format!("Authors: {}", names.join(", "))),
            source: "Authors".to_string(),
            origin: ChunkOrigin::Authors,
            page: None,
        };
        let weight = category_weight(priority, ChunkCategory::Authors);
        chunks.push(self.scored(rendered, ChunkCategory::Authors, weight, scorer));
    }

    fn render_section(&self, section: &Section) -> Rendered {
        let source = if section.title.trim().is_empty() {
            "Untitled section".to_string()
        } else {
            section.title.trim().to_string()
        };
        Rendered {
            content: self.cap(&section.text()),
            source,
            origin: ChunkOrigin::Section,
            page: section.page_start,
        }
    }

    fn render_page(&self, extraction: &PaperExtraction, page: u32) -> Option<Rendered> {
        let parts: Vec<String> = extraction
            .sections
            .iter()
            .filter(|s| s.covers_page(page))
            .map(|s| format!("{}\n{}", s.title.trim(), s.text()))
            .collect();

        if parts.is_empty() {
            return None;
        }

        Some(Rendered {
            content: self.cap(&parts.join("\n\n")),
            source: format!("Page {page}"),
            origin: ChunkOrigin::Page,
            page: Some(page),
        })
    }

    fn render_figure(&self, figure: &Figure) -> Rendered {
        let mut content = format!("{}: {}", figure.label.trim(), figure.caption.trim());
        if let Some(ocr) = figure.ocr_text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            content.push_str("\nText in figure: ");
            content.push_str(ocr);
        }
        Rendered {
            content: self.cap(&content),
            source: figure.label.trim().to_string(),
            origin: ChunkOrigin::Figure,
            page: figure.page,
        }
    }

    fn render_table(&self, table: &Table) -> Rendered {
        let mut lines = vec![format!("{}: {}", table.label.trim(), table.caption.trim())];
        if !table.headers.is_empty() {
            lines.push(table.headers.join(" | "));
        }
        for row in table.rows.iter().take(self.config.max_table_rows) {
            lines.push(row.join(" | "));
        }
        let hidden = table.rows.len().saturating_sub(self.config.max_table_rows);
        if hidden > 0 {
            lines.push(format!("... ({hidden} more rows)"));
        }

        Rendered {
            content: self.cap(&lines.join("\n")),
            source: table.label.trim().to_string(),
            origin: ChunkOrigin::Table,
            page: table.page,
        }
    }

    fn render_equation(&self, equation: &Equation) -> Rendered {
        Rendered {
            content: self.cap(&format!("{}: {}", equation.label.trim(), equation.latex.trim())),
            source: equation.label.trim().to_string(),
            origin: ChunkOrigin::Equation,
            page: equation.page,
        }
    }

    fn render_reference(&self, reference: &Reference) -> Rendered {
        let mut content = reference.title.trim().to_string();
        if !reference.authors.is_empty() {
            content.push_str(&format!(". {}", reference.authors.join(", ")));
        }
        if let Some(venue) = reference.venue.as_deref().filter(|v| !v.trim().is_empty()) {
            content.push_str(&format!(". {}", venue.trim()));
        }
        if let Some(year) = reference.year {
            content.push_str(&format!(" ({year})"));
        }
        if let Some(link) = reference.doi.as_deref().or(reference.url.as_deref()) {
            content.push_str(&format!(". {link}"));
        }
        Rendered {
            content: self.cap(&content),
            source: "References".to_string(),
            origin: ChunkOrigin::Reference,
            page: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Author;
    use crate::retrieval::{PrioritySource, QueryClassifier, StaticPriorityTable};

    fn section(title: &str, section_type: &str, page: u32, text: &str) -> Section {
        Section {
            title: title.into(),
            section_type: section_type.into(),
            page_start: Some(page),
            page_end: Some(page),
            paragraphs: vec![text.into()],
        }
    }

    fn extraction() -> PaperExtraction {
        PaperExtraction {
            title: "Sparse Attention at Scale".into(),
            abstract_text: "We present a sparse attention mechanism.".into(),
            sections: vec![
                section("Introduction", "introduction", 1, "Attention is costly."),
                section("Our Approach", "", 2, "We prune attention heads."),
                section("Results", "results", 4, "Accuracy improves by 2 points."),
                section("Conclusion", "conclusion", 5, "Sparse attention works."),
            ],
            figures: vec![Figure {
                label: "Figure 3".into(),
                caption: "Attention maps".into(),
                page: Some(4),
                ocr_text: None,
            }],
            tables: vec![Table {
                label: "Table 1".into(),
                caption: "Main results".into(),
                headers: vec!["Model".into(), "Acc".into()],
                rows: vec![vec!["Ours".into(), "91.2".into()]],
                page: Some(4),
            }],
            equations: vec![Equation {
                label: "Equation 1".into(),
                latex: "a = softmax(QK^T)".into(),
                page: Some(2),
            }],
            references: Vec::new(),
            authors: vec![Author {
                name: "Ada Lovelace".into(),
                affiliation: Some("Analytical Engines Ltd".into()),
                email: None,
            }],
        }
    }

    fn retrieve(query: &str, selection: Option<Selection<'_>>) -> Vec<ContentChunk> {
        let analysis = QueryClassifier::new().classify(query, selection.is_some());
        let priority = StaticPriorityTable.priority_for(&analysis);
        ContentRetriever::new(RetrievalConfig::default()).retrieve(
            &extraction(),
            &analysis,
            &priority,
            selection.as_ref(),
        )
    }

    #[test]
    fn test_section_categories() {
        assert_eq!(
            section_category(&section("Our Approach", "", 1, "")),
            Some(ChunkCategory::Methodology)
        );
        assert_eq!(
            section_category(&section("Setup", "experiments", 1, "")),
            Some(ChunkCategory::Experiments)
        );
        assert_eq!(
            section_category(&section("Discussion", "", 1, "")),
            Some(ChunkCategory::Conclusion)
        );
        assert_eq!(section_category(&section("Related Work", "", 1, "")), None);
    }

    #[test]
    fn test_summary_includes_authors_and_framing() {
        let chunks = retrieve("Summarize this paper", None);
        let categories: Vec<ChunkCategory> = chunks.iter().map(|c| c.category()).collect();

        assert!(categories.contains(&ChunkCategory::Abstract));
        assert!(categories.contains(&ChunkCategory::Introduction));
        assert!(categories.contains(&ChunkCategory::Conclusion));
        assert!(categories.contains(&ChunkCategory::Authors));
        assert!(!categories.contains(&ChunkCategory::Equation));

        let authors = chunks
            .iter()
            .find(|c| c.category() == ChunkCategory::Authors)
            .expect("author chunk");
        assert_eq!(authors.content(), "Authors: Ada Lovelace (Analytical Engines Ltd)");
    }

    #[test]
    fn test_figure_reference_is_forced() {
        let chunks = retrieve("What does Figure 3 show?", None);
        let forced = chunks
            .iter()
            .find(|c| c.category() == ChunkCategory::SpecificReference)
            .expect("forced chunk");
        assert_eq!(forced.score(), 1.0);
        assert!(forced.source().contains('3'));
        assert_eq!(forced.content(), "Figure 3: Attention maps");
    }

    #[test]
    fn test_missing_reference_is_skipped() {
        let chunks = retrieve("What does Figure 9 show?", None);
        assert!(chunks
            .iter()
            .all(|c| c.category() != ChunkCategory::SpecificReference));
    }

    #[test]
    fn test_page_reference_collects_covering_sections() {
        let chunks = retrieve("What is on page 4?", None);
        let page = chunks
            .iter()
            .find(|c| c.origin() == ChunkOrigin::Page)
            .expect("page chunk");
        assert_eq!(page.page(), Some(4));
        assert!(page.content().contains("Accuracy improves"));
    }

    #[test]
    fn test_selection_comes_first() {
        let selection = Selection {
            text: "We prune attention heads.",
            page: Some(2),
        };
        let chunks = retrieve("Explain this", Some(selection));
        assert_eq!(chunks[0].category(), ChunkCategory::SelectedText);
        assert_eq!(chunks[0].score(), 1.0);
        assert_eq!(chunks[0].page(), Some(2));
    }

    #[test]
    fn test_math_keywords_pull_equations() {
        let chunks = retrieve("Which formula do they use?", None);
        assert!(chunks.iter().any(|c| c.category() == ChunkCategory::Equation));
    }

    #[test]
    fn test_scores_stay_in_unit_range() {
        for query in ["Summarize this paper", "How well does it perform on Table 1?", ""] {
            for chunk in retrieve(query, None) {
                assert!((0.0..=1.0).contains(&chunk.score()), "{query}: {}", chunk.score());
            }
        }
    }

    #[test]
    fn test_long_bodies_are_capped() {
        let mut paper = extraction();
        paper.abstract_text = "x".repeat(10_000);
        let analysis = QueryClassifier::new().classify("Summarize this paper", false);
        let priority = StaticPriorityTable.priority_for(&analysis);
        let config = RetrievalConfig {
            max_chunk_chars: 100,
            ..RetrievalConfig::default()
        };
        let chunks = ContentRetriever::new(config).retrieve(&paper, &analysis, &priority, None);
        assert!(chunks.iter().all(|c| c.content().chars().count() <= 100));
    }
}
