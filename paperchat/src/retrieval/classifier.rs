//! Pattern-based query classification.
//!
//! The pattern tables are compiled once per process and never mutated.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use super::text::compile_all;
use crate::llm::prompts::system_prompt;
use crate::models::{
    ContextualDepth, PromptStrategy, QueryAnalysis, QueryType, ResponseFormat, SpecificReferences,
};

const SUMMARY_PATTERNS: &[&str] = &[
    r"(?i)\bsummar(y|ize|ise|izing|ising)\b",
    r"(?i)\boverview\b",
    r"(?i)\btl;?dr\b",
    r"(?i)\bmain (idea|ideas|point|points|contribution|contributions)\b",
    r"(?i)\bkey (findings|takeaways|points|contributions)\b",
    r"(?i)\bwhat is (this|the) paper about\b",
    r"(?i)\bgist\b",
];

const METHODOLOGY_PATTERNS: &[&str] = &[
    r"(?i)\bmethod(s|ology|ologies)?\b",
    r"(?i)\bapproach(es)?\b",
    r"(?i)\bprocedures?\b",
    r"(?i)\btechniques?\b",
    r"(?i)\bexperimental (setup|design)\b",
    r"(?i)\bhow (did|do|does) (they|the authors)\b",
];

const RESULTS_PATTERNS: &[&str] = &[
    r"(?i)\bresults?\b",
    r"(?i)\bfindings?\b",
    r"(?i)\boutcomes?\b",
    r"(?i)\bperformance\b",
    r"(?i)\baccuracy\b",
    r"(?i)\bmetrics?\b",
    r"(?i)\bscores?\b",
    r"(?i)\bhow well\b",
];

const TECHNICAL_PATTERNS: &[&str] = &[
    r"(?i)\balgorithms?\b",
    r"(?i)\bimplement(ation|ed|s)?\b",
    r"(?i)\barchitectures?\b",
    r"(?i)\b(hyper)?-?parameters?\b",
    r"(?i)\bformulas?\b",
    r"(?i)\bderivations?\b",
    r"(?i)\btechnical\b",
    r"(?i)\bcomplexity\b",
    r"(?i)\bin detail\b",
];

const COMPARISON_PATTERNS: &[&str] = &[
    r"(?i)\bcompar(e|ed|es|ing|ison|isons)\b",
    r"(?i)\bversus\b",
    r"(?i)\bvs\.?(\s|$)",
    r"(?i)\bbaselines?\b",
    r"(?i)\b(better|worse) than\b",
    r"(?i)\bdiffer(ence|ences|s)?\b",
    r"(?i)\brelated work\b",
    r"(?i)\bstate[- ]of[- ]the[- ]art\b",
];

// Shares the extraction patterns so every extracted reference also classifies
const SPECIFIC_REFERENCE_PATTERNS: &[&str] = &[
    FIGURE_REF,
    TABLE_REF,
    EQUATION_REF,
    PAGE_REF,
    r"(?i)\bsection\s*\d+",
];

const CONCEPTUAL_PATTERNS: &[&str] = &[
    r"(?i)\bwhat (is|are|does)\b",
    r"(?i)\bexplain\b",
    r"(?i)\bdefine\b",
    r"(?i)\bdefinitions?\b",
    r"(?i)\bconcepts?\b",
    r"(?i)\bmeaning\b",
    r"(?i)\bintuition\b",
    r"(?i)\bwhy (is|does|do)\b",
];

const FIGURE_REF: &str = r"(?i)\b(?:figure|fig\.?)\s*(\d+)";
const TABLE_REF: &str = r"(?i)\b(?:table|tab\.)\s*(\d+)";
const EQUATION_REF: &str = r"(?i)(?:\b(?:equation|eq\.?)\s*\(?(\d+)\)?|\((\d+)\)\s*equation)";
const PAGE_REF: &str = r"(?i)(?:\bpage\s*(\d+)|\bp\.\s*(\d+))";

const SECTION_KEYWORDS: &[&str] = &[
    "introduction",
    "methodology",
    "results",
    "conclusion",
    "discussion",
    "references",
    "abstract",
];

const TECHNICAL_TERMS: &[&str] = &[
    "algorithm",
    "implementation",
    "performance",
    "optimization",
    "architecture",
    "framework",
    "methodology",
    "analysis",
    "evaluation",
];

const REFERENCE_INTENT: &[&str] = &[
    r"(?i)\breferences?\b",
    r"(?i)\bcitations?\b",
    r"(?i)\bcit(e|es|ed|ing)\b",
    r"(?i)\bbibliography\b",
    r"(?i)\brelated work\b",
    r"(?i)\bprior work\b",
];

const AUTHOR_INTENT: &[&str] = &[
    r"(?i)\bauthors?\b",
    r"(?i)\bwho wrote\b",
    r"(?i)\bwritten by\b",
    r"(?i)\bwho are the\b",
    r"(?i)\baffiliations?\b",
    r"(?i)\bresearchers\b",
];

const TITLE_INTENT: &[&str] = &[
    r"(?i)\btitled?\b",
    r"(?i)\bname of (this|the) paper\b",
    r"(?i)\bwhat is (this|the) paper called\b",
];

struct Patterns {
    by_type: Vec<(QueryType, Vec<Regex>)>,
    figure: Vec<Regex>,
    table: Vec<Regex>,
    equation: Vec<Regex>,
    page: Vec<Regex>,
    reference_intent: Vec<Regex>,
    author_intent: Vec<Regex>,
    title_intent: Vec<Regex>,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        by_type: QueryType::ORDERED
            .into_iter()
            .map(|t| (t, compile_all(patterns_for(t))))
            .collect(),
        figure: compile_all(&[FIGURE_REF]),
        table: compile_all(&[TABLE_REF]),
        equation: compile_all(&[EQUATION_REF]),
        page: compile_all(&[PAGE_REF]),
        reference_intent: compile_all(REFERENCE_INTENT),
        author_intent: compile_all(AUTHOR_INTENT),
        title_intent: compile_all(TITLE_INTENT),
    })
}

fn patterns_for(query_type: QueryType) -> &'static [&'static str] {
    match query_type {
        QueryType::Summary => SUMMARY_PATTERNS,
        QueryType::Methodology => METHODOLOGY_PATTERNS,
        QueryType::Results => RESULTS_PATTERNS,
        QueryType::TechnicalDetails => TECHNICAL_PATTERNS,
        QueryType::Comparison => COMPARISON_PATTERNS,
        QueryType::SpecificReference => SPECIFIC_REFERENCE_PATTERNS,
        QueryType::Conceptual => CONCEPTUAL_PATTERNS,
        QueryType::General => &[],
    }
}

fn any_match(regexes: &[Regex], text: &str) -> bool {
    regexes.iter().any(|re| re.is_match(text))
}

/// Every integer captured by any group of `regexes`. Numerals that do not
/// fit a `u32` are skipped.
fn capture_numbers(regexes: &[Regex], text: &str) -> BTreeSet<u32> {
    regexes
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .flat_map(|caps| {
            caps.iter()
                .skip(1)
                .flatten()
                .filter_map(|m| m.as_str().parse::<u32>().ok())
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn extract_references(query: &str) -> SpecificReferences {
    let p = patterns();
    let lowered = query.to_lowercase();

    SpecificReferences {
        figures: capture_numbers(&p.figure, query),
        tables: capture_numbers(&p.table, query),
        equations: capture_numbers(&p.equation, query),
        pages: capture_numbers(&p.page, query),
        sections: SECTION_KEYWORDS
            .iter()
            .filter(|k| lowered.contains(*k))
            .map(|k| k.to_string())
            .collect(),
    }
}

/// True when the question asks what the paper is called.
pub fn asks_about_title(query: &str) -> bool {
    any_match(&patterns().title_intent, query)
}

fn technical_term_count(query: &str) -> usize {
    let lowered = query.to_lowercase();
    TECHNICAL_TERMS
        .iter()
        .map(|term| lowered.matches(term).count())
        .sum()
}

/// `min(1, chars/100 + 0.2 * matched + 0.1 * technical terms)`.
pub fn complexity(query: &str, matched_types: usize) -> f32 {
    let length = query.chars().count() as f32 / 100.0;
    let facets = 0.2 * matched_types as f32;
    let terms = 0.1 * technical_term_count(query) as f32;
    (length + facets + terms).min(1.0)
}

/// Fixed generation parameters for a query type.
pub fn prompt_strategy(query_type: QueryType, complexity: f32) -> PromptStrategy {
    let (temperature, max_tokens, response_format, structured, citations, accuracy, words) =
        match query_type {
            QueryType::Summary => (0.3, 2000, ResponseFormat::StructuredSummary, true, false, false, (200, 400)),
            QueryType::Methodology => (0.2, 3000, ResponseFormat::StepByStep, true, true, false, (300, 600)),
            QueryType::Results => (0.1, 2500, ResponseFormat::DataFocused, true, true, true, (250, 500)),
            QueryType::TechnicalDetails => {
                (0.1, 3500, ResponseFormat::TechnicalDeepDive, true, true, true, (300, 700))
            }
            QueryType::Comparison => {
                (0.2, 3000, ResponseFormat::ComparativeAnalysis, true, true, false, (300, 600))
            }
            QueryType::SpecificReference => {
                (0.1, 1500, ResponseFormat::ReferenceFocused, false, true, true, (100, 250))
            }
            QueryType::Conceptual => (0.3, 2500, ResponseFormat::Explanatory, false, false, false, (200, 400)),
            QueryType::General => (0.25, 2000, ResponseFormat::Conversational, false, false, false, (150, 350)),
        };

    PromptStrategy {
        temperature,
        max_tokens,
        system_prompt: system_prompt(query_type).to_string(),
        response_format,
        use_structured_format: structured,
        include_citations: citations,
        emphasize_accuracy: accuracy,
        contextual_depth: ContextualDepth::from_complexity(complexity),
        word_range: words,
    }
}

/// Classifies free-text questions about a paper.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryClassifier;

impl QueryClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Deterministic: the same inputs always produce an identical analysis.
    pub fn classify(&self, query: &str, has_selection: bool) -> QueryAnalysis {
        let p = patterns();

        let matched_types: BTreeSet<QueryType> = p
            .by_type
            .iter()
            .filter(|(_, regexes)| any_match(regexes, query))
            .map(|(t, _)| *t)
            .collect();

        let primary_type = p
            .by_type
            .iter()
            .map(|(t, _)| *t)
            .find(|t| matched_types.contains(t))
            .unwrap_or(QueryType::General);

        let complexity = complexity(query, matched_types.len());
        let include_references = matched_types.contains(&QueryType::Comparison)
            || any_match(&p.reference_intent, query);
        let include_authors = any_match(&p.author_intent, query);

        QueryAnalysis {
            query: query.to_string(),
            primary_type,
            references: extract_references(query),
            complexity,
            include_references,
            include_authors,
            has_selection,
            strategy: prompt_strategy(primary_type, complexity),
            matched_types,
        }
    }
}
