//! Prompt templates for paper chat
//!
//! These templates use basic `format!()` interpolation for type safety.
//! Missing variables will cause compile-time errors.

use crate::models::{QueryType, ResponseFormat};

/// Persona shared by every query type.
pub const BASE_PERSONA: &str = "You are an expert research assistant who analyzes academic \
papers. Answer strictly from the paper content provided below. When the content does not \
contain the answer, say so plainly instead of guessing.";

/// Query-type specific guidance appended to [`BASE_PERSONA`].
///
/// # Example
/// ```
/// use paperchat::llm::prompts::system_prompt;
/// use paperchat::models::QueryType;
///
/// assert!(system_prompt(QueryType::Results).contains("specific numbers"));
/// ```
pub fn system_prompt(query_type: QueryType) -> &'static str {
    match query_type {
        QueryType::Summary => {
            "Give a concise, well-organized overview of the paper: the problem it addresses, \
             the approach, the main findings and why they matter."
        }
        QueryType::Methodology => {
            "Explain the methodology step by step: the setup, the procedure, the design \
             choices and the reasoning the authors give for them."
        }
        QueryType::Results => {
            "Focus on quantitative results and findings. Include specific numbers, metrics \
             and comparisons exactly as reported, and point to the figures or tables they \
             come from."
        }
        QueryType::TechnicalDetails => {
            "Provide a precise technical explanation: algorithms, architectures, parameters \
             and equations. Preserve notation and state assumptions explicitly."
        }
        QueryType::Comparison => {
            "Compare the approaches, baselines or results involved. Make the dimensions of \
             comparison explicit and state which option wins on each, with evidence."
        }
        QueryType::SpecificReference => {
            "Answer about the specific figure, table, equation, section or page the user \
             referenced. Describe exactly what it shows and how it fits the paper."
        }
        QueryType::Conceptual => {
            "Explain the concept clearly, building from intuition to the paper's precise \
             usage. Use analogies sparingly and stay faithful to the paper."
        }
        QueryType::General => {
            "Answer the question helpfully and conversationally, grounded in the paper."
        }
    }
}

/// How the answer should be laid out for each response format.
pub fn format_instruction(format: ResponseFormat) -> &'static str {
    match format {
        ResponseFormat::StructuredSummary => {
            "Structure the answer as: Problem, Approach, Key Findings, Significance."
        }
        ResponseFormat::StepByStep => "Walk through the method as numbered steps.",
        ResponseFormat::DataFocused => {
            "Lead with the numbers. Present key metrics as a short list or table."
        }
        ResponseFormat::TechnicalDeepDive => {
            "Go into technical depth. Use equations or pseudo-code where they clarify."
        }
        ResponseFormat::ComparativeAnalysis => {
            "Organize the answer by comparison dimension, noting similarities and differences."
        }
        ResponseFormat::ReferenceFocused => {
            "Stay focused on the referenced element. Quote its label and caption."
        }
        ResponseFormat::Explanatory => "Explain in plain language first, then add precision.",
        ResponseFormat::Conversational => "Keep a natural, conversational tone.",
    }
}

/// Generate a prompt asking the model which parts of a paper a question needs
///
/// The model answers with JSON that deserializes into
/// [`ContentRequirements`](crate::retrieval::ContentRequirements).
///
/// # Example
/// ```
/// use paperchat::llm::prompts::content_requirements_prompt;
///
/// let prompt = content_requirements_prompt("How does the model compare to BERT?");
/// assert!(prompt.contains("BERT"));
/// assert!(prompt.contains("JSON"));
/// ```
pub fn content_requirements_prompt(query: &str) -> String {
    format!(
        r#"Decide which parts of an academic paper are needed to answer the question below.

Rate each content category from 0.0 (not needed) to 1.0 (essential):
abstract, introduction, methodology, results, conclusion, technical, figures, tables,
equations, references, experiments, code, specific_reference, contextual.

Also decide whether the bibliography is needed (include_references) and whether
author information is needed (include_authors).

Question: {query}

Respond with valid JSON only. Example format:
{{"weights": {{"results": 0.9, "tables": 0.8, "abstract": 0.3}}, "include_references": false, "include_authors": false}}"#
    )
}

/// Canned answer used when the generation service fails.
///
/// Precedence: authors when they were asked for and are known, then the
/// title when the question is about it, then a generic apology.
///
/// # Example
/// ```
/// use paperchat::llm::prompts::fallback_answer;
///
/// let answer = fallback_answer("Attention Is All You Need", &["Vaswani".to_string()], true, false);
/// assert!(answer.starts_with("This paper was written by Vaswani"));
/// ```
pub fn fallback_answer(
    title: &str,
    authors: &[String],
    asks_authors: bool,
    asks_title: bool,
) -> String {
    let title = title.trim();

    if asks_authors && !authors.is_empty() {
        return format!(
            "This paper was written by {}. I couldn't generate a more detailed answer right \
             now, please try again in a moment.",
            authors.join(", ")
        );
    }

    if asks_title && !title.is_empty() {
        return format!("The paper is titled \"{title}\".");
    }

    let about = match (title.is_empty(), authors.is_empty()) {
        (false, false) => format!(" about \"{title}\" by {}", authors.join(", ")),
        (false, true) => format!(" about \"{title}\""),
        _ => String::new(),
    };
    format!(
        "I'm sorry, I couldn't generate an answer to your question{about} right now. \
         Please try again in a moment."
    )
}

/// Apology returned with `success: false` when a turn cannot run at all.
pub const TURN_FAILED_MESSAGE: &str =
    "I'm sorry, I couldn't process your question. Please try again.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompts_are_distinct() {
        let all = [
            QueryType::Summary,
            QueryType::Methodology,
            QueryType::Results,
            QueryType::TechnicalDetails,
            QueryType::Comparison,
            QueryType::SpecificReference,
            QueryType::Conceptual,
            QueryType::General,
        ];
        let prompts: std::collections::HashSet<&str> =
            all.iter().map(|t| system_prompt(*t)).collect();
        assert_eq!(prompts.len(), all.len());
    }

    #[test]
    fn test_requirements_prompt_lists_categories() {
        let prompt = content_requirements_prompt("test question");
        assert!(prompt.contains("test question"));
        assert!(prompt.contains("specific_reference"));
        assert!(prompt.contains("include_authors"));
    }

    #[test]
    fn test_fallback_prefers_authors_when_asked() {
        let authors = vec!["Ada Lovelace".to_string(), "Charles Babbage".to_string()];
        let answer = fallback_answer("Engines", &authors, true, true);
        assert!(answer.starts_with("This paper was written by Ada Lovelace, Charles Babbage"));
    }

    #[test]
    fn test_fallback_title_question() {
        let answer = fallback_answer("Engines", &[], true, true);
        assert_eq!(answer, "The paper is titled \"Engines\".");
    }

    #[test]
    fn test_fallback_generic_mentions_paper() {
        let authors = vec!["Ada Lovelace".to_string()];
        let answer = fallback_answer("Engines", &authors, false, false);
        assert!(answer.starts_with("I'm sorry"));
        assert!(answer.contains("\"Engines\" by Ada Lovelace"));

        let bare = fallback_answer("", &[], false, false);
        assert!(bare.starts_with("I'm sorry, I couldn't generate an answer to your question right now"));
    }
}
